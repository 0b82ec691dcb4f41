//! Shared test utilities for the omeka-iiif test suite.
//!
//! Provides recording stand-ins for every external collaborator so pipeline
//! logic can be exercised without a network or a real image decoder:
//!
//! - [`MockTransport`]: canned API pages and download bodies, records calls
//! - [`StubTiler`]: writes a fixed `info.json`, fails on sources starting with `BAD`
//! - [`MemorySink`]: collects serialized manifests in memory
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let transport = MockTransport::new()
//!     .with_page("/api/items?page=1", &[item_json(1, Some("Still Image"), "Harbour")])
//!     .with_page("/api/items?page=2", &[])
//!     .with_page("/api/files?item=1&page=1", &[file_json(10, &original_url("a.jpg"))])
//!     .with_download(&original_url("a.jpg"), b"pixels");
//! ```

use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::omeka::{Transport, TransportError};
use crate::presentation::Manifest;
use crate::tiles::info::{INFO_FILENAME, LEVEL0_PROFILE};
use crate::tiles::{TileError, TileGenerator};
use crate::writer::{ManifestSink, WriteError, WrittenManifest, manifest_uri};

/// Base URL every mock endpoint lives under.
pub const MOCK_BASE: &str = "http://omeka.test";

/// Download URL for an original in the mock Omeka instance.
pub fn original_url(name: &str) -> String {
    format!("{}/files/original/{}", MOCK_BASE, name)
}

// =========================================================================
// JSON fixtures
// =========================================================================

/// An Omeka item record with a single Title element.
pub fn item_json(id: u64, item_type: Option<&str>, title: &str) -> Value {
    json!({
        "id": id,
        "item_type": item_type.map(|name| json!({"id": 6, "name": name})),
        "element_texts": [
            {"html": false, "text": title, "element": {"id": 50, "name": "Title"}}
        ]
    })
}

/// An Omeka file record.
pub fn file_json(id: u64, original: &str) -> Value {
    json!({
        "id": id,
        "file_urls": {"original": original, "thumbnail": null}
    })
}

// =========================================================================
// MockTransport
// =========================================================================

/// Transport serving canned responses. Unregistered GETs return an empty
/// body; unregistered downloads fail with HTTP 404.
#[derive(Default)]
pub struct MockTransport {
    bodies: HashMap<String, Vec<u8>>,
    downloads: HashMap<String, Vec<u8>>,
    get_calls: RefCell<Vec<String>>,
    download_calls: RefCell<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` as a JSON list at `MOCK_BASE + path_and_query`.
    pub fn with_page(self, path_and_query: &str, records: &[Value]) -> Self {
        let body = serde_json::to_vec(records).unwrap();
        self.with_body(path_and_query, &body)
    }

    /// Serve a raw body at `MOCK_BASE + path_and_query`.
    pub fn with_body(mut self, path_and_query: &str, body: &[u8]) -> Self {
        self.bodies
            .insert(format!("{}{}", MOCK_BASE, path_and_query), body.to_vec());
        self
    }

    pub fn with_download(mut self, url: &str, body: &[u8]) -> Self {
        self.downloads.insert(url.to_string(), body.to_vec());
        self
    }

    /// Full URLs (with query) of every GET, in order.
    pub fn get_calls(&self) -> Vec<String> {
        self.get_calls.borrow().clone()
    }

    pub fn download_calls(&self) -> Vec<String> {
        self.download_calls.borrow().clone()
    }

    pub fn reset_calls(&self) {
        self.get_calls.borrow_mut().clear();
        self.download_calls.borrow_mut().clear();
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, TransportError> {
        let key = if query.is_empty() {
            url.to_string()
        } else {
            let qs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{}?{}", url, qs.join("&"))
        };
        self.get_calls.borrow_mut().push(key.clone());
        Ok(self.bodies.get(&key).cloned().unwrap_or_default())
    }

    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        self.download_calls.borrow_mut().push(url.to_string());
        match self.downloads.get(url) {
            Some(body) => {
                sink.write_all(body)?;
                Ok(body.len() as u64)
            }
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

// =========================================================================
// StubTiler
// =========================================================================

/// Width and height every stub tile set reports.
pub const STUB_DIMENSIONS: (u32, u32) = (2000, 1500);

/// Tile generator that writes only a descriptor.
///
/// Sources whose bytes start with `BAD` are rejected as unsupported.
#[derive(Default)]
pub struct StubTiler {
    calls: RefCell<Vec<String>>,
}

impl StubTiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of every successful generation, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl TileGenerator for StubTiler {
    fn generate(
        &self,
        source: &Path,
        tiles_dir: &Path,
        identifier: &str,
    ) -> Result<(), TileError> {
        let bytes = std::fs::read(source)?;
        if bytes.starts_with(b"BAD") {
            return Err(TileError::Unsupported {
                path: source.to_path_buf(),
                reason: "stub rejects BAD sources".into(),
            });
        }
        let dir = tiles_dir.join(identifier);
        std::fs::create_dir_all(&dir)?;
        let (width, height) = STUB_DIMENSIONS;
        let info = json!({
            "@id": identifier,
            "width": width,
            "height": height,
            "profile": [LEVEL0_PROFILE],
            "sizes": [
                {"width": 250, "height": 188},
                {"width": width, "height": height}
            ]
        });
        std::fs::write(
            dir.join(INFO_FILENAME),
            serde_json::to_string_pretty(&info).unwrap(),
        )?;
        self.calls.borrow_mut().push(identifier.to_string());
        Ok(())
    }
}

// =========================================================================
// MemorySink
// =========================================================================

/// Manifest sink keeping `(item_id, serialized manifest)` pairs.
#[derive(Default)]
pub struct MemorySink {
    pub written: Vec<(u64, String)>,
}

impl ManifestSink for MemorySink {
    fn write(&mut self, item_id: u64, manifest: &Manifest) -> Result<WrittenManifest, WriteError> {
        self.written.push((item_id, manifest.to_pretty_string()?));
        Ok(WrittenManifest {
            path: format!("manifests/{}.json", item_id).into(),
            uri: manifest_uri(item_id),
        })
    }
}
