//! # omeka-iiif
//!
//! Batch migration of an Omeka collection to static IIIF assets. Every item of
//! one type (by default "Still Image") becomes a IIIF Presentation 2.1
//! manifest whose canvases point at level-0 tile pyramids that any plain file
//! server can host.
//!
//! # Pipeline
//!
//! ```text
//! Omeka API  →  data/<basename>           (download originals)
//!            →  images/tiles/<sha256>/    (tile pyramid + info.json)
//!            →  manifests/<item-id>.json  (one manifest per item)
//!            →  manifests/index.json      (ordered list of manifests)
//! ```
//!
//! Both expensive steps are cached on disk: an original whose file name is
//! already in `data/` is not downloaded again, and an image whose content hash
//! already has a tile directory is not tiled again. A second run over an
//! unchanged collection therefore only talks to the API and rewrites JSON.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`omeka`] | HTTP transport trait, Omeka API models, lazy paginated item/file enumeration |
//! | [`download`] | Skip-if-present download of originals into `data/` |
//! | [`cache`] | Presence checks, content hashing, cache hit/miss accounting |
//! | [`metadata`] | Flattening element texts into a key → value map; the item title |
//! | [`tiles`] | Tile generator trait, built-in static tiler, `info.json` model, thumbnail URLs |
//! | [`presentation`] | IIIF Presentation 2.1 manifest builder |
//! | [`writer`] | Manifest sink trait, atomic manifest and index writes |
//! | [`migrate`] | The orchestrator tying it all together; progress events and summary |
//! | [`config`] | `omeka-iiif.toml` loading and validation, output layout |
//! | [`output`] | CLI formatting of progress events and the run summary |
//!
//! # Seams
//!
//! Network, tiling, cache presence and manifest output sit behind traits
//! ([`omeka::Transport`], [`tiles::TileGenerator`], [`cache::Presence`],
//! [`writer::ManifestSink`]). [`migrate::migrate`] plugs in the real ones;
//! tests drive [`migrate::Migration`] with in-memory stand-ins.

pub mod cache;
pub mod config;
pub mod download;
pub mod metadata;
pub mod migrate;
pub mod omeka;
pub mod output;
pub mod presentation;
pub mod tiles;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
