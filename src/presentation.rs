//! IIIF Presentation API 2.1 manifest builder.
//!
//! Builds the object graph of one manifest and serializes it:
//!
//! ```text
//! Manifest ── metadata [{label, value}]
//!    └── Sequence
//!          └── Canvas (page-1, page-2, ...)  width/height/thumbnail
//!                └── Annotation (sc:painting)
//!                      └── Image ── service (IIIF Image API, level 0)
//! ```
//!
//! Construction follows the shape of the IIIF "factory" libraries: each level
//! hands out a mutable reference to the child it just created, so callers
//! fill in dimensions after the fact.
//!
//! ## Identifiers
//!
//! All `@id`s hang off the base URI the manifests are served from:
//!
//! ```text
//! {base}/manifests/{ident}.json
//! {base}/sequence/{ident}/normal.json
//! {base}/canvas/{ident}/{canvas}.json
//! {base}/annotation/{ident}/{canvas}-{n}.json
//! ```

use serde::Serialize;

use crate::metadata::Metadata;
use crate::tiles::info::{IMAGE_CONTEXT, LEVEL0_PROFILE};

pub const PRESENTATION_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";

/// Creates manifests rooted at one base URI.
#[derive(Debug, Clone)]
pub struct ManifestFactory {
    base_uri: String,
}

impl ManifestFactory {
    pub fn new(base_uri: &str) -> Self {
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Start an empty manifest identified by `ident`.
    pub fn manifest(&self, ident: &str, label: &str) -> Manifest {
        Manifest {
            context: PRESENTATION_CONTEXT,
            id: format!("{}/manifests/{}.json", self.base_uri, ident),
            kind: "sc:Manifest",
            label: label.to_string(),
            metadata: Vec::new(),
            sequences: Vec::new(),
            base: self.base_uri.clone(),
            ident: ident.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    pub sequences: Vec<Sequence>,
    #[serde(skip)]
    base: String,
    #[serde(skip)]
    ident: String,
}

impl Manifest {
    /// Replace the descriptive metadata, one entry per key in key order.
    pub fn set_metadata(&mut self, meta: &Metadata) {
        self.metadata = meta
            .iter()
            .map(|(label, value)| MetadataEntry {
                label: label.clone(),
                value: value.clone(),
            })
            .collect();
    }

    /// Append a new, empty sequence and return it.
    pub fn sequence(&mut self) -> &mut Sequence {
        let id = if self.sequences.is_empty() {
            format!("{}/sequence/{}/normal.json", self.base, self.ident)
        } else {
            format!(
                "{}/sequence/{}/s{}.json",
                self.base,
                self.ident,
                self.sequences.len()
            )
        };
        self.sequences.push(Sequence {
            id,
            kind: "sc:Sequence",
            canvases: Vec::new(),
            base: self.base.clone(),
            ident: self.ident.clone(),
        });
        let last = self.sequences.len() - 1;
        &mut self.sequences[last]
    }

    /// Total canvases across all sequences.
    pub fn canvas_count(&self) -> usize {
        self.sequences.iter().map(|s| s.canvases.len()).sum()
    }

    /// Pretty-printed JSON document.
    pub fn to_pretty_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Sequence {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    pub canvases: Vec<Canvas>,
    #[serde(skip)]
    base: String,
    #[serde(skip)]
    ident: String,
}

impl Sequence {
    /// Append a canvas with the given identifier segment and label.
    pub fn canvas(&mut self, canvas_ident: &str, label: &str) -> &mut Canvas {
        self.canvases.push(Canvas {
            id: format!("{}/canvas/{}/{}.json", self.base, self.ident, canvas_ident),
            kind: "sc:Canvas",
            label: label.to_string(),
            width: 0,
            height: 0,
            thumbnail: None,
            images: Vec::new(),
            annotation_base: format!("{}/annotation/{}/{}", self.base, self.ident, canvas_ident),
        });
        let last = self.canvases.len() - 1;
        &mut self.canvases[last]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Canvas {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    pub label: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub images: Vec<Annotation>,
    #[serde(skip)]
    annotation_base: String,
}

impl Canvas {
    /// Append a painting annotation targeting this canvas.
    pub fn annotation(&mut self) -> &mut Annotation {
        let n = self.images.len() + 1;
        self.images.push(Annotation {
            id: format!("{}-{}.json", self.annotation_base, n),
            kind: "oa:Annotation",
            motivation: "sc:painting",
            resource: None,
            on: self.id.clone(),
        });
        let last = self.images.len() - 1;
        &mut self.images[last]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    motivation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ImageResource>,
    pub on: String,
}

impl Annotation {
    /// Set the annotation's image.
    ///
    /// With `iiif` set, `image_id` is the base URI of a IIIF Image API
    /// service: the resource points at its full-size rendering and carries a
    /// `service` block. Otherwise `image_id` is used as a plain image URL.
    pub fn image(&mut self, image_id: &str, iiif: bool) -> &mut ImageResource {
        let image_id = image_id.trim_end_matches('/');
        let (id, service) = if iiif {
            (
                format!("{}/full/full/0/default.jpg", image_id),
                Some(ImageService {
                    context: IMAGE_CONTEXT,
                    id: image_id.to_string(),
                    profile: LEVEL0_PROFILE,
                }),
            )
        } else {
            (image_id.to_string(), None)
        };
        self.resource.insert(ImageResource {
            id,
            kind: "dctypes:Image",
            format: "image/jpeg",
            width: None,
            height: None,
            service,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResource {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ImageService>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageService {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    profile: &'static str,
}
