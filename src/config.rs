//! Migration configuration.
//!
//! Loaded from an optional `omeka-iiif.toml` in the working directory (or the
//! file named with `--config`). Every key is optional; a missing default file
//! means stock defaults. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! output_dir = "."            # Root for data/, images/tiles/ and manifests/
//! item_type = "Still Image"   # Omeka item type to migrate
//!
//! [tiles]
//! size = 1024                 # Tile edge in pixels
//! quality = 90                # JPEG quality for tiles (1-100)
//!
//! [http]
//! user_agent = "omeka-iiif/0.1.0"
//! # timeout_secs = 60         # Omit for no timeout
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! <output_dir>/
//! ├── data/                      # Downloaded originals, named by URL basename
//! ├── images/tiles/<hash>/       # Tile pyramid + info.json per source image
//! └── manifests/
//!     ├── <item-id>.json         # One IIIF Presentation manifest per item
//!     └── index.json             # Ordered list of produced manifests
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "omeka-iiif.toml";

const MIN_TILE_SIZE: u32 = 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level migration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Root directory for all generated output.
    pub output_dir: PathBuf,
    /// Name of the Omeka item type to migrate; other items are skipped.
    pub item_type: String,
    pub tiles: TilesConfig,
    pub http: HttpConfig,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            item_type: "Still Image".to_string(),
            tiles: TilesConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Tile pyramid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TilesConfig {
    /// Tile edge length in pixels.
    pub size: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u8,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            size: 1024,
            quality: 90,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("omeka-iiif/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
        }
    }
}

impl MigrateConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiles.size < MIN_TILE_SIZE {
            return Err(ConfigError::Validation(format!(
                "tiles.size must be at least {MIN_TILE_SIZE}"
            )));
        }
        if self.tiles.quality == 0 || self.tiles.quality > 100 {
            return Err(ConfigError::Validation(
                "tiles.quality must be 1-100".into(),
            ));
        }
        if self.item_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "item_type must not be empty".into(),
            ));
        }
        if self.http.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be positive; omit it to disable the timeout".into(),
            ));
        }
        Ok(())
    }

    /// Output directory layout derived from `output_dir`.
    pub fn layout(&self) -> Layout {
        Layout::new(&self.output_dir)
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<MigrateConfig, ConfigError> {
    let config: MigrateConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// When `required` is false a missing file yields the stock defaults;
/// when true (the user named the file explicitly) it is an error.
pub fn load_config(path: &Path, required: bool) -> Result<MigrateConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            Ok(MigrateConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Fixed directory layout under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Downloaded originals.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Tile sets, one directory per content hash.
    pub fn tiles_dir(&self) -> PathBuf {
        self.root.join("images").join("tiles")
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.root.join("manifests")
    }

    /// Create every output directory.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(self.data_dir())?;
        fs::create_dir_all(self.tiles_dir())?;
        fs::create_dir_all(self.manifests_dir())
    }
}
