//! Manifest persistence and the manifest index.
//!
//! Each finished manifest is written to `manifests/<item-id>.json` and then
//! recorded in `manifests/index.json`, an ordered list of
//! `{"manifestUri": "/manifests/<item-id>.json"}` records.
//!
//! The index update is a pure [`ManifestIndex::appended`] over the loaded
//! state followed by a whole-file rewrite. All writes go to a temporary file
//! in the destination directory and are renamed into place, so a crash leaves
//! either the old or the new file, never a truncated one. A crash between the
//! manifest write and the index rewrite can still leave a manifest that the
//! index does not list.
//!
//! There is no locking: two runs against one output directory race on the
//! index.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::presentation::Manifest;

/// Name of the index file inside the manifests directory.
pub const INDEX_FILENAME: &str = "index.json";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Replace `path` with `contents` via a temp file in the same directory.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Site-relative URI of an item's manifest.
pub fn manifest_uri(item_id: u64) -> String {
    format!("/manifests/{}.json", item_id)
}

/// One index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(rename = "manifestUri")]
    pub manifest_uri: String,
}

/// Ordered list of produced manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestIndex(pub Vec<IndexRecord>);

impl ManifestIndex {
    /// Load the index; a missing file is an empty index. A corrupt file is
    /// an error.
    pub fn load(path: &Path) -> Result<Self, WriteError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// The index with `record` appended, unless its URI is already listed.
    ///
    /// This is not a plain append: a record that is already present leaves
    /// the index unchanged, so re-running a migration over the same output
    /// does not list a manifest twice.
    pub fn appended(mut self, record: IndexRecord) -> Self {
        if !self.0.contains(&record) {
            self.0.push(record);
        }
        self
    }

    pub fn save(&self, path: &Path) -> Result<(), WriteError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.0
    }
}

/// Where a manifest ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenManifest {
    pub path: PathBuf,
    pub uri: String,
}

/// Receives finished manifests.
pub trait ManifestSink {
    fn write(&mut self, item_id: u64, manifest: &Manifest) -> Result<WrittenManifest, WriteError>;
}

/// [`ManifestSink`] that writes manifest files and maintains the index.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    manifests_dir: PathBuf,
}

impl ManifestWriter {
    pub fn new(manifests_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifests_dir: manifests_dir.into(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.manifests_dir.join(INDEX_FILENAME)
    }
}

impl ManifestSink for ManifestWriter {
    fn write(&mut self, item_id: u64, manifest: &Manifest) -> Result<WrittenManifest, WriteError> {
        let path = self.manifests_dir.join(format!("{}.json", item_id));
        write_atomic(&path, manifest.to_pretty_string()?.as_bytes())?;

        let uri = manifest_uri(item_id);
        let index_path = self.index_path();
        ManifestIndex::load(&index_path)?
            .appended(IndexRecord {
                manifest_uri: uri.clone(),
            })
            .save(&index_path)?;
        debug!(%uri, "index updated");

        Ok(WrittenManifest { path, uri })
    }
}
