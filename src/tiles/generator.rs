//! Tile generator trait and tile-set preparation.
//!
//! The [`TileGenerator`] trait is the boundary to whatever renders the tile
//! pyramid. The production implementation is
//! [`StaticTiler`](super::static_tiler::StaticTiler); tests substitute a stub.
//!
//! [`prepare_tiles`] wraps a generator with the cache policy: the generator
//! only runs when no tile set exists for the source's content hash, and the
//! descriptor's `@id` is rewritten to the public tile URL either way.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::info::{INFO_FILENAME, ImageInfo, tile_url};
use crate::cache::{self, CacheStatus, Lookup, Presence};
use crate::writer::write_atomic;

#[derive(Error, Debug)]
pub enum TileError {
    /// The source cannot be decoded. The only recoverable tile error: the
    /// file is skipped and the item carries on without it.
    #[error("unsupported image {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid image descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("tile encoding failed: {0}")]
    Encode(String),
}

impl TileError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TileError::Unsupported { .. })
    }
}

/// Renders a source image into a IIIF tile set.
pub trait TileGenerator {
    /// Write the tile pyramid and `info.json` for `source` into
    /// `tiles_dir/identifier`.
    ///
    /// Must return [`TileError::Unsupported`] for images it cannot read.
    fn generate(&self, source: &Path, tiles_dir: &Path, identifier: &str)
    -> Result<(), TileError>;
}

/// A tile set ready to be referenced from a manifest.
#[derive(Debug, Clone)]
pub struct TileSet {
    pub hash: String,
    pub info: ImageInfo,
    pub status: CacheStatus,
}

/// Make sure a tile set exists for `source` (content hash `hash`) and point
/// its descriptor at `{iiif_url}/images/tiles/{hash}`.
pub fn prepare_tiles(
    generator: &dyn TileGenerator,
    presence: &dyn Presence,
    tiles_dir: &Path,
    source: &Path,
    hash: &str,
    iiif_url: &str,
) -> Result<TileSet, TileError> {
    let lookup = cache::lookup(presence, tiles_dir.join(hash));
    if let Lookup::Miss(_) = lookup {
        info!(source = %source.display(), %hash, "generating tiles");
        generator.generate(source, tiles_dir, hash)?;
    } else {
        debug!(%hash, "tile set already present");
    }
    let status = lookup.status();

    let info_path = lookup.into_path().join(INFO_FILENAME);
    let content = std::fs::read_to_string(&info_path)?;
    let mut info: ImageInfo =
        serde_json::from_str(&content).map_err(|source| TileError::Descriptor {
            path: info_path.clone(),
            source,
        })?;
    info.id = tile_url(iiif_url, hash);

    let json = info
        .to_pretty_json()
        .map_err(|source| TileError::Descriptor {
            path: info_path.clone(),
            source,
        })?;
    write_atomic(&info_path, json.as_bytes())?;

    Ok(TileSet {
        hash: hash.to_string(),
        info,
        status,
    })
}
