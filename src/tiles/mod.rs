//! IIIF tile sets.
//!
//! The module is split into:
//! - **Calculations**: pure pyramid arithmetic (scale factors, regions, sizes)
//! - **Info**: the `info.json` descriptor and URL derivation
//! - **Generator**: [`TileGenerator`] trait + cache-aware [`prepare_tiles`]
//! - **Static tiler**: [`StaticTiler`], the `image`-crate implementation

mod calculations;
pub mod generator;
pub mod info;
pub mod static_tiler;

pub use generator::{TileError, TileGenerator, TileSet, prepare_tiles};
pub use info::{ImageInfo, MissingSizes, SizeEntry, thumbnail_url, tile_url};
pub use static_tiler::StaticTiler;
