//! IIIF Image API `info.json` descriptor.
//!
//! Only the fields the migration reads or rewrites are typed (`@id`, `width`,
//! `height`, `sizes`). Everything else a tile generator writes (`@context`,
//! `profile`, `tiles`, ...) is carried through untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the descriptor inside a tile set.
pub const INFO_FILENAME: &str = "info.json";

pub const IMAGE_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const IMAGE_PROTOCOL: &str = "http://iiif.io/api/image";
pub const LEVEL0_PROFILE: &str = "http://iiif.io/api/image/2/level0.json";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("image descriptor {image_id} lists no sizes")]
pub struct MissingSizes {
    pub image_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(rename = "@id")]
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub sizes: Vec<SizeEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEntry {
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Pretty-printed JSON, as persisted in the tile set.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Public URL of a tile set: `{iiif_url}/images/tiles/{hash}`.
pub fn tile_url(iiif_url: &str, hash: &str) -> String {
    format!("{}/images/tiles/{}", iiif_url.trim_end_matches('/'), hash)
}

/// Thumbnail URL for a descriptor: the first listed size's width, default
/// quality JPEG.
///
/// ```text
/// {id}/full/{width},/0/default.jpg
/// ```
pub fn thumbnail_url(info: &ImageInfo) -> Result<String, MissingSizes> {
    let first = info.sizes.first().ok_or_else(|| MissingSizes {
        image_id: info.id.clone(),
    })?;
    Ok(format!(
        "{}/full/{},/0/default.jpg",
        info.id.trim_matches('/'),
        first.width
    ))
}
