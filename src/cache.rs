//! Content-addressed caching for idempotent re-runs.
//!
//! A migration run is expensive in two places: downloading originals from
//! Omeka and rendering tile pyramids. Both are skipped when their output is
//! already on disk, so re-running against the same output directory only
//! re-does the cheap parts (enumeration, metadata, manifest assembly).
//!
//! # Cache keys
//!
//! - **Downloads** are keyed by the basename of the source URL. There is no
//!   content verification and no handling of two URLs sharing a basename.
//! - **Tile sets** are keyed by the SHA-256 of the downloaded file's bytes.
//!   Two distinct source files with identical bytes share one tile set, and
//!   hash equality is taken as sufficient to reuse it.
//!
//! # Lookup
//!
//! Every download and tile generation is preceded by an explicit [`lookup`]
//! that returns [`Lookup::Hit`] or [`Lookup::Miss`]. Presence is answered by a
//! [`Presence`] implementation, so the policy can be tested without a real
//! filesystem; production uses [`DiskPresence`].

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Read size used when hashing source files.
const HASH_CHUNK_SIZE: usize = 4096;

/// Answers whether a cache entry exists at a path.
pub trait Presence {
    fn exists(&self, path: &Path) -> bool;
}

/// Presence backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskPresence;

impl Presence for DiskPresence {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Outcome of a cache lookup. Both variants carry the entry's path: the
/// existing entry on a hit, the location to produce it at on a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(PathBuf),
    Miss(PathBuf),
}

impl Lookup {
    pub fn into_path(self) -> PathBuf {
        match self {
            Lookup::Hit(p) | Lookup::Miss(p) => p,
        }
    }

    pub fn status(&self) -> CacheStatus {
        match self {
            Lookup::Hit(_) => CacheStatus::Cached,
            Lookup::Miss(_) => CacheStatus::Produced,
        }
    }
}

/// Look up the cache entry at `path`.
pub fn lookup(presence: &dyn Presence, path: PathBuf) -> Lookup {
    if presence.exists(&path) {
        Lookup::Hit(path)
    } else {
        Lookup::Miss(path)
    }
}

/// SHA-256 of a file's contents as a lowercase hex string.
///
/// Reads in fixed-size chunks so large originals are never held in memory.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether an asset was reused from the cache or produced in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Cached,
    Produced,
}

/// Summary of cache performance for one kind of asset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, status: CacheStatus) {
        match status {
            CacheStatus::Cached => self.hits += 1,
            CacheStatus::Produced => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} new ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} new", self.misses)
        }
    }
}
