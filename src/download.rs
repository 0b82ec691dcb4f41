//! Download originals to local storage.
//!
//! Each remote file lands at `data/<basename-of-url>`. When that path already
//! exists the download is skipped without any network access; there is no
//! integrity check and no handling of two URLs sharing a basename.
//!
//! The body is streamed into a temporary file next to the destination and
//! renamed into place once complete, so an interrupted transfer never leaves a
//! truncated file that a later run would treat as cached.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{self, CacheStatus, Lookup, Presence};
use crate::omeka::{Transport, TransportError};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("cannot derive a file name from {0}")]
    InvalidUrl(String),
    #[error("download of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A local copy of a remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub status: CacheStatus,
}

/// Local file name for a download URL: the last path segment, without query
/// string or fragment.
pub fn basename(url: &str) -> Result<String, DownloadError> {
    let parsed =
        reqwest::Url::parse(url).map_err(|_| DownloadError::InvalidUrl(url.to_string()))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DownloadError::InvalidUrl(url.to_string()))
}

/// Fetch `url` into `data_dir`, unless a file of the same basename is
/// already there.
pub fn download(
    transport: &dyn Transport,
    presence: &dyn Presence,
    data_dir: &Path,
    url: &str,
) -> Result<Downloaded, DownloadError> {
    let name = basename(url)?;
    match cache::lookup(presence, data_dir.join(name)) {
        Lookup::Hit(path) => {
            debug!(%url, path = %path.display(), "already downloaded");
            Ok(Downloaded {
                path,
                status: CacheStatus::Cached,
            })
        }
        Lookup::Miss(path) => {
            info!("downloading {} to {}", url, path.display());
            let mut staging = tempfile::NamedTempFile::new_in(data_dir)?;
            transport
                .fetch_into(url, staging.as_file_mut())
                .map_err(|source| DownloadError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            staging.persist(&path).map_err(|e| e.error)?;
            Ok(Downloaded {
                path,
                status: CacheStatus::Produced,
            })
        }
    }
}
