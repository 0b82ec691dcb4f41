//! End-to-end migration through the public API with the real static tiler.
//!
//! The Omeka instance is an in-process transport serving canned JSON and a
//! PNG encoded in memory, so no network is needed. Everything else (hashing,
//! tiling, manifest and index writes) runs for real against a temp dir.

use image::{ImageEncoder, RgbImage};
use omeka_iiif::cache::DiskPresence;
use omeka_iiif::config::Layout;
use omeka_iiif::migrate::{MigrateEvent, Migration};
use omeka_iiif::omeka::{OmekaClient, Transport, TransportError};
use omeka_iiif::tiles::StaticTiler;
use omeka_iiif::writer::ManifestWriter;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const OMEKA: &str = "http://omeka.test";
const IIIF: &str = "https://iiif.test/";

struct Canned {
    responses: HashMap<String, Vec<u8>>,
}

impl Canned {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    fn serve(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    fn serve_json(self, url: &str, value: Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap();
        self.serve(url, body)
    }
}

impl Transport for Canned {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, TransportError> {
        let qs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let key = format!("{}?{}", url, qs.join("&"));
        Ok(self.responses.get(&key).cloned().unwrap_or_default())
    }

    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        match self.responses.get(url) {
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

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 2) as u8, (y * 3) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

fn collection() -> Canned {
    let item = json!({
        "id": 42,
        "item_type": {"id": 6, "name": "Still Image"},
        "element_texts": [
            {"text": "Lighthouse", "element": {"name": "Title"}},
            {"text": "Coastal survey", "element": {"name": "Subject"}}
        ]
    });
    let files = json!([
        {"id": 1, "file_urls": {"original": format!("{OMEKA}/files/original/notes.txt")}},
        {"id": 2, "file_urls": {"original": format!("{OMEKA}/files/original/lighthouse.png")}}
    ]);
    Canned::new()
        .serve_json(&format!("{OMEKA}/api/items?page=1"), json!([item]))
        .serve_json(&format!("{OMEKA}/api/items?page=2"), json!([]))
        .serve_json(&format!("{OMEKA}/api/files?item=42&page=1"), files)
        .serve_json(&format!("{OMEKA}/api/files?item=42&page=2"), json!([]))
        .serve(
            &format!("{OMEKA}/files/original/notes.txt"),
            b"not an image".to_vec(),
        )
        .serve(
            &format!("{OMEKA}/files/original/lighthouse.png"),
            png_bytes(100, 80),
        )
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn migrates_collection_to_static_iiif() {
    let tmp = TempDir::new().unwrap();
    let transport = collection();
    let tiler = StaticTiler::new(64, 80);
    let layout = Layout::new(tmp.path());
    let mut writer = ManifestWriter::new(layout.manifests_dir());
    let migration = Migration::new(
        OmekaClient::new(&transport, OMEKA, "Still Image"),
        &tiler,
        &DiskPresence,
        layout,
        IIIF,
    );

    let mut events = Vec::new();
    let summary = migration
        .run(&mut writer, &mut |e| events.push(e.clone()))
        .unwrap();

    assert_eq!(summary.manifests_written, 1);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.files_skipped, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        MigrateEvent::FileSkipped { source, .. } if source.ends_with("notes.txt")
    )));

    let manifest = read_json(&tmp.path().join("manifests/42.json"));
    assert_eq!(manifest["label"], "Lighthouse");
    assert_eq!(
        manifest["metadata"],
        json!([
            {"label": "subject", "value": "Coastal survey"},
            {"label": "title", "value": "Lighthouse"}
        ])
    );

    let canvases = manifest["sequences"][0]["canvases"].as_array().unwrap();
    assert_eq!(canvases.len(), 1);
    let canvas = &canvases[0];
    assert_eq!(canvas["label"], "Page 1");
    assert_eq!(canvas["width"], 100);
    assert_eq!(canvas["height"], 80);

    // The thumbnail is the smallest pre-rendered size and exists on disk.
    let service = canvas["images"][0]["resource"]["service"]["@id"]
        .as_str()
        .unwrap();
    let hash = service.rsplit('/').next().unwrap();
    assert_eq!(service, format!("https://iiif.test/images/tiles/{hash}"));
    assert_eq!(
        canvas["thumbnail"],
        format!("{service}/full/50,/0/default.jpg")
    );
    let tile_dir = tmp.path().join("images/tiles").join(hash);
    assert!(tile_dir.join("full/50,/0/default.jpg").is_file());

    let info = read_json(&tile_dir.join("info.json"));
    assert_eq!(info["@id"], service);
    assert_eq!(info["width"], 100);

    let index = read_json(&tmp.path().join("manifests/index.json"));
    assert_eq!(index, json!([{"manifestUri": "/manifests/42.json"}]));
}
