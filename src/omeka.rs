//! Omeka REST API client.
//!
//! Two collection endpoints are consumed, both paged by a `page` query
//! parameter starting at 1:
//!
//! ```text
//! GET {omeka_url}/api/items?page=N            → [item, ...]
//! GET {omeka_url}/api/files?item=ID&page=N    → [file, ...]
//! ```
//!
//! Paging stops at the first page that returns an empty list. The files
//! endpoint additionally stops on an empty response body, which some Omeka
//! installs send instead of `[]`.
//!
//! Enumeration is lazy: a page is only requested once the previous one has
//! been consumed. It is restartable only by calling [`OmekaClient::items`]
//! again, which starts over from page 1.
//!
//! Network and parse failures are yielded as `Err` and end the sequence.
//!
//! HTTP goes through the [`Transport`] trait so the enumerators and the
//! downloader can be exercised against a recorded mock.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::HttpConfig;

/// Bytes read per iteration when streaming a download to disk.
const DOWNLOAD_CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum OmekaError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Blocking HTTP access used by the enumerators and the downloader.
pub trait Transport {
    /// GET `url` with `query` appended, returning the whole response body.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, TransportError>;

    /// GET `url` and stream the body into `sink`. Returns the bytes written.
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(Self { client })
    }

    fn send(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, TransportError> {
        let resp = self.client.get(url).query(query).send()?;
        check_status(resp.url().as_str(), resp.status())?;
        Ok(resp)
    }
}

/// Any non-2xx response is an error.
fn check_status(url: &str, status: reqwest::StatusCode) -> Result<(), TransportError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, TransportError> {
        let resp = self.send(url, query)?;
        Ok(resp.bytes()?.to_vec())
    }

    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        let mut resp = self.send(url, &[])?;
        let mut buf = [0u8; DOWNLOAD_CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let n = resp.read(&mut buf)?;
            if n == 0 {
                break;
            }
            sink.write_all(&buf[..n])?;
            written += n as u64;
        }
        sink.flush()?;
        Ok(written)
    }
}

// ============================================================================
// Remote records
// ============================================================================

/// An Omeka item. Only the fields the migration reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(default)]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub element_texts: Vec<ElementText>,
}

impl Item {
    /// True when the item's type name equals `name`. Items with a missing or
    /// null type never match.
    pub fn is_type(&self, name: &str) -> bool {
        self.item_type
            .as_ref()
            .is_some_and(|t| t.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemType {
    #[serde(default)]
    pub name: Option<String>,
}

/// Type name of a raw item record, if it has one.
fn raw_type_name(record: &serde_json::Value) -> Option<&str> {
    record.get("item_type")?.get("name")?.as_str()
}

/// One Dublin Core (or item type) element value attached to an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementText {
    #[serde(default)]
    pub text: Option<String>,
    pub element: Element,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub name: String,
}

/// A file attached to an item.
#[derive(Debug, Clone, Deserialize)]
pub struct OmekaFile {
    pub id: u64,
    pub file_urls: FileUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrls {
    /// The untouched upload; the only variant used for tiling.
    pub original: String,
}

// ============================================================================
// Client + pagination
// ============================================================================

/// Entry point for the Omeka API of one instance.
pub struct OmekaClient<'a> {
    transport: &'a dyn Transport,
    base_url: String,
    item_type: String,
}

impl<'a> OmekaClient<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &str, item_type: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            item_type: item_type.to_string(),
        }
    }

    pub fn transport(&self) -> &'a dyn Transport {
        self.transport
    }

    /// All items of the configured type, in API order.
    ///
    /// Items of other types (or with no type at all) are consumed from their
    /// page and dropped without being decoded, so an odd record of another
    /// type never hides the items next to it.
    pub fn items(&self) -> Items<'a> {
        let url = format!("{}/api/items", self.base_url);
        Items {
            pages: Pages::new(self.transport, url.clone(), Vec::new(), false),
            url,
            item_type: self.item_type.clone(),
        }
    }

    /// All files of one item, in API order.
    pub fn files(&self, item_id: u64) -> Pages<'a, OmekaFile> {
        Pages::new(
            self.transport,
            format!("{}/api/files", self.base_url),
            vec![("item", item_id.to_string())],
            true,
        )
    }
}

/// Items of one type, filtered out of the paged item listing.
pub struct Items<'a> {
    pages: Pages<'a, serde_json::Value>,
    url: String,
    item_type: String,
}

impl Iterator for Items<'_> {
    type Item = Result<Item, OmekaError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.pages.find(|result| match result {
            Ok(record) => raw_type_name(record) == Some(self.item_type.as_str()),
            Err(_) => true,
        })?;
        Some(record.and_then(|record| {
            serde_json::from_value(record).map_err(|source| OmekaError::Malformed {
                url: self.url.clone(),
                source,
            })
        }))
    }
}

/// Lazy page-until-empty iterator over a JSON list endpoint.
pub struct Pages<'a, T> {
    transport: &'a dyn Transport,
    url: String,
    query: Vec<(&'static str, String)>,
    /// Treat an empty response body as the end of the listing.
    empty_body_ends: bool,
    page: u32,
    buffer: VecDeque<T>,
    done: bool,
}

impl<'a, T: DeserializeOwned> Pages<'a, T> {
    fn new(
        transport: &'a dyn Transport,
        url: String,
        query: Vec<(&'static str, String)>,
        empty_body_ends: bool,
    ) -> Self {
        Self {
            transport,
            url,
            query,
            empty_body_ends,
            page: 1,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Fetch the next page into the buffer. Marks the sequence done on an
    /// empty page.
    fn fetch_page(&mut self) -> Result<(), OmekaError> {
        let mut query = self.query.clone();
        query.push(("page", self.page.to_string()));
        debug!(url = %self.url, page = self.page, "fetching page");

        let body = self.transport.get(&self.url, &query)?;
        if self.empty_body_ends && body.is_empty() {
            self.done = true;
            return Ok(());
        }

        let records: Vec<T> =
            serde_json::from_slice(&body).map_err(|source| OmekaError::Malformed {
                url: format!("{}?page={}", self.url, self.page),
                source,
            })?;
        if records.is_empty() {
            self.done = true;
        } else {
            self.page += 1;
            self.buffer.extend(records);
        }
        Ok(())
    }
}

impl<T: DeserializeOwned> Iterator for Pages<'_, T> {
    type Item = Result<T, OmekaError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
