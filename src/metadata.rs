//! Item metadata extraction.
//!
//! Omeka attaches metadata to an item as a list of element texts, each naming
//! an element ("Title", "Creator", "Date", ...) and carrying a text value. The
//! migration flattens that list into a single mapping keyed by the lower-cased
//! element name, which becomes the manifest's descriptive metadata.
//!
//! Repeated element names are not merged: the last value wins. An element
//! text with no `text` contributes an empty string.
//!
//! The manifest label comes from the `title` key. Items without one fail with
//! [`MissingTitle`] rather than being given a made-up label.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::omeka::ElementText;

/// Lower-cased element name → text value.
pub type Metadata = BTreeMap<String, String>;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("item {item_id} has no Title element")]
pub struct MissingTitle {
    pub item_id: u64,
}

/// Flatten element texts into a key/value mapping.
pub fn extract_metadata(element_texts: &[ElementText]) -> Metadata {
    let mut meta = Metadata::new();
    for et in element_texts {
        meta.insert(
            et.element.name.to_lowercase(),
            et.text.clone().unwrap_or_default(),
        );
    }
    meta
}

/// The item's title, used as the manifest label.
pub fn title(item_id: u64, meta: &Metadata) -> Result<&str, MissingTitle> {
    meta.get("title")
        .map(String::as_str)
        .ok_or(MissingTitle { item_id })
}
