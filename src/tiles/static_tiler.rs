//! Static IIIF level-0 tiler built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Crop + scale | `DynamicImage::crop_imm` + `resize_exact` (`Lanczos3`) |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |
//!
//! ## Output
//!
//! ```text
//! images/tiles/<hash>/
//! ├── info.json
//! ├── 0,0,1024,1024/1024,/0/default.jpg     # scale factor 1
//! ├── 0,0,2048,2048/1024,/0/default.jpg     # scale factor 2
//! ├── full/750,/0/default.jpg               # one whole-image size per factor
//! └── ...
//! ```
//!
//! Tiles are written into a staging directory under `tiles_dir` which is
//! renamed to `<hash>` only once complete.

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use serde_json::json;
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use super::calculations::{Tile, scale_factors, size_path, sizes, tiles_at};
use super::generator::{TileError, TileGenerator};
use super::info::{IMAGE_CONTEXT, IMAGE_PROTOCOL, INFO_FILENAME, LEVEL0_PROFILE};

/// Level-0 static tile renderer.
#[derive(Debug, Clone, Copy)]
pub struct StaticTiler {
    tile_size: u32,
    quality: u8,
}

impl StaticTiler {
    pub fn new(tile_size: u32, quality: u8) -> Self {
        Self {
            tile_size,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

impl Default for StaticTiler {
    fn default() -> Self {
        Self::new(1024, 90)
    }
}

/// Decode an image, sniffing the format from its bytes rather than trusting
/// the file extension.
fn load_image(path: &Path) -> Result<DynamicImage, TileError> {
    let unsupported = |reason: String| TileError::Unsupported {
        path: path.to_path_buf(),
        reason,
    };
    let reader = ImageReader::open(path)?
        .with_guessed_format()
        .map_err(TileError::Io)?;
    let img = reader.decode().map_err(|e| unsupported(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(unsupported("image has no pixels".into()));
    }
    Ok(img)
}

fn save_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), TileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(fs::File::create(path)?);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| TileError::Encode(format!("{}: {}", path.display(), e)))
}

impl StaticTiler {
    fn render_tile(
        &self,
        img: &DynamicImage,
        tile: &Tile,
        root: &Path,
    ) -> Result<(), TileError> {
        let region = img.crop_imm(tile.x, tile.y, tile.region_width, tile.region_height);
        let scaled = if (tile.width, tile.height) == (tile.region_width, tile.region_height) {
            region
        } else {
            region.resize_exact(tile.width, tile.height, FilterType::Lanczos3)
        };
        save_jpeg(
            &scaled,
            &root.join(tile.path(img.width(), img.height())),
            self.quality,
        )
    }
}

impl TileGenerator for StaticTiler {
    fn generate(
        &self,
        source: &Path,
        tiles_dir: &Path,
        identifier: &str,
    ) -> Result<(), TileError> {
        let img = load_image(source)?;
        let (width, height) = (img.width(), img.height());

        fs::create_dir_all(tiles_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(tiles_dir)?;

        let factors = scale_factors(width, height, self.tile_size);
        let mut tile_count = 0usize;
        for &sf in &factors {
            for tile in tiles_at(width, height, self.tile_size, sf) {
                self.render_tile(&img, &tile, staging.path())?;
                tile_count += 1;
            }
        }

        let size_list = sizes(width, height, &factors);
        for &(w, h) in &size_list {
            let scaled = if (w, h) == (width, height) {
                img.clone()
            } else {
                img.resize_exact(w, h, FilterType::Lanczos3)
            };
            save_jpeg(&scaled, &staging.path().join(size_path(w)), self.quality)?;
        }

        let info = json!({
            "@context": IMAGE_CONTEXT,
            "@id": identifier,
            "protocol": IMAGE_PROTOCOL,
            "width": width,
            "height": height,
            "profile": [LEVEL0_PROFILE],
            "tiles": [{"width": self.tile_size, "scaleFactors": factors}],
            "sizes": size_list
                .iter()
                .map(|&(w, h)| json!({"width": w, "height": h}))
                .collect::<Vec<_>>(),
        });
        let info_json = serde_json::to_string_pretty(&info).map_err(|source| {
            TileError::Descriptor {
                path: staging.path().join(INFO_FILENAME),
                source,
            }
        })?;
        fs::write(staging.path().join(INFO_FILENAME), info_json)?;

        // Release the guard so the rename owns the directory.
        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, tiles_dir.join(identifier)) {
            let _ = fs::remove_dir_all(&staged);
            return Err(e.into());
        }
        debug!(%identifier, width, height, tiles = tile_count, "tile set written");
        Ok(())
    }
}
