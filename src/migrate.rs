//! Migration pipeline: Omeka items → IIIF tiles + manifests.
//!
//! For every item of the configured type, in API order:
//!
//! 1. Flatten its element texts into metadata; the title labels the manifest.
//! 2. For each of its files, in API order:
//!    - download the original to `data/` (skipped if already there)
//!    - hash it and make sure a tile set exists under `images/tiles/<hash>/`
//!    - if the image cannot be decoded, skip the file and carry on
//!    - otherwise add a canvas `page-<n>` / `Page <n>`, numbered over the
//!      files that succeeded, with a thumbnail and one painted image
//! 3. If at least one page was produced, hand the manifest to the sink
//!    (which writes it and updates the index); otherwise drop it.
//!
//! Everything runs sequentially on the calling thread. Failures other than
//! an undecodable image abort the run; downloaded files and finished tile
//! sets stay on disk and make the next run cheaper.
//!
//! Collaborators come in through traits ([`Transport`], [`TileGenerator`],
//! [`Presence`], [`ManifestSink`]) so tests run the whole pipeline against
//! mocks. [`migrate`] wires up the production implementations.

use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{self, CacheStats, CacheStatus, DiskPresence, Presence};
use crate::config::{Layout, MigrateConfig};
use crate::download::{DownloadError, download};
use crate::metadata::{self, MissingTitle, extract_metadata};
use crate::omeka::{HttpTransport, Item, OmekaClient, OmekaError, Transport, TransportError};
use crate::presentation::ManifestFactory;
use crate::tiles::{MissingSizes, StaticTiler, TileError, TileGenerator, prepare_tiles, thumbnail_url};
use crate::writer::{ManifestSink, ManifestWriter, WriteError};

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] TransportError),
    #[error("Omeka API error: {0}")]
    Omeka(#[from] OmekaError),
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("Tiling failed: {0}")]
    Tiles(#[from] TileError),
    #[error(transparent)]
    MissingTitle(#[from] MissingTitle),
    #[error(transparent)]
    MissingSizes(#[from] MissingSizes),
    #[error("Writing manifest failed: {0}")]
    Write(#[from] WriteError),
}

/// Progress reported while migrating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateEvent {
    ItemStarted {
        item_id: u64,
        title: String,
    },
    PageAdded {
        page: u32,
        source: String,
        download: CacheStatus,
        tiles: CacheStatus,
    },
    FileSkipped {
        source: String,
        reason: String,
    },
    ManifestWritten {
        item_id: u64,
        uri: String,
    },
    ItemDiscarded {
        item_id: u64,
        title: String,
    },
}

/// Totals for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrateSummary {
    pub items: u32,
    pub manifests_written: u32,
    pub items_discarded: u32,
    pub pages: u32,
    pub files_skipped: u32,
    pub downloads: CacheStats,
    pub tiles: CacheStats,
}

/// One configured migration from an Omeka instance to a IIIF mount.
pub struct Migration<'a> {
    omeka: OmekaClient<'a>,
    tiler: &'a dyn TileGenerator,
    presence: &'a dyn Presence,
    layout: Layout,
    factory: ManifestFactory,
}

impl<'a> Migration<'a> {
    pub fn new(
        omeka: OmekaClient<'a>,
        tiler: &'a dyn TileGenerator,
        presence: &'a dyn Presence,
        layout: Layout,
        iiif_url: &str,
    ) -> Self {
        Self {
            omeka,
            tiler,
            presence,
            layout,
            factory: ManifestFactory::new(iiif_url),
        }
    }

    /// Migrate every item, reporting progress through `on_event`.
    pub fn run(
        &self,
        sink: &mut dyn ManifestSink,
        on_event: &mut dyn FnMut(&MigrateEvent),
    ) -> Result<MigrateSummary, MigrateError> {
        self.layout.ensure()?;
        let mut summary = MigrateSummary::default();
        for item in self.omeka.items() {
            let item = item?;
            summary.items += 1;
            self.migrate_item(&item, sink, &mut summary, on_event)?;
        }
        Ok(summary)
    }

    fn migrate_item(
        &self,
        item: &Item,
        sink: &mut dyn ManifestSink,
        summary: &mut MigrateSummary,
        on_event: &mut dyn FnMut(&MigrateEvent),
    ) -> Result<(), MigrateError> {
        let meta = extract_metadata(&item.element_texts);
        let title = metadata::title(item.id, &meta)?.to_string();
        on_event(&MigrateEvent::ItemStarted {
            item_id: item.id,
            title: title.clone(),
        });

        let mut manifest = self.factory.manifest(&item.id.to_string(), &title);
        manifest.set_metadata(&meta);
        let sequence = manifest.sequence();
        let data_dir = self.layout.data_dir();
        let tiles_dir = self.layout.tiles_dir();
        let mut page = 0u32;

        for file in self.omeka.files(item.id) {
            let file = file?;
            let url = file.file_urls.original.as_str();
            let downloaded = download(self.omeka.transport(), self.presence, &data_dir, url)?;
            summary.downloads.record(downloaded.status);

            let hash = cache::hash_file(&downloaded.path)?;
            let tiles = match prepare_tiles(
                self.tiler,
                self.presence,
                &tiles_dir,
                &downloaded.path,
                &hash,
                self.factory.base_uri(),
            ) {
                Ok(tiles) => tiles,
                Err(e) if e.is_unsupported() => {
                    warn!(item = item.id, %url, "skipping file: {}", e);
                    summary.files_skipped += 1;
                    on_event(&MigrateEvent::FileSkipped {
                        source: url.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            summary.tiles.record(tiles.status);

            page += 1;
            let info = &tiles.info;
            let canvas = sequence.canvas(&format!("page-{page}"), &format!("Page {page}"));
            canvas.thumbnail = Some(thumbnail_url(info)?);
            let image = canvas.annotation().image(&info.id, true);
            image.width = Some(info.width);
            image.height = Some(info.height);
            canvas.width = info.width;
            canvas.height = info.height;

            on_event(&MigrateEvent::PageAdded {
                page,
                source: url.to_string(),
                download: downloaded.status,
                tiles: tiles.status,
            });
        }

        if page > 0 {
            let written = sink.write(item.id, &manifest)?;
            info!(item = item.id, pages = page, path = %written.path.display(), "manifest written");
            summary.manifests_written += 1;
            summary.pages += page;
            on_event(&MigrateEvent::ManifestWritten {
                item_id: item.id,
                uri: written.uri,
            });
        } else {
            info!(item = item.id, "no usable images, manifest discarded");
            summary.items_discarded += 1;
            on_event(&MigrateEvent::ItemDiscarded {
                item_id: item.id,
                title,
            });
        }
        Ok(())
    }
}

/// Migrate `omeka_url` to static IIIF assets served from `iiif_url`, using
/// the real HTTP client, tiler and filesystem.
pub fn migrate(
    omeka_url: &str,
    iiif_url: &str,
    config: &MigrateConfig,
    on_event: &mut dyn FnMut(&MigrateEvent),
) -> Result<MigrateSummary, MigrateError> {
    let transport = HttpTransport::new(&config.http)?;
    let tiler = StaticTiler::new(config.tiles.size, config.tiles.quality);
    let layout = config.layout();
    let mut writer = ManifestWriter::new(layout.manifests_dir());
    let migration = Migration::new(
        OmekaClient::new(&transport as &dyn Transport, omeka_url, &config.item_type),
        &tiler,
        &DiskPresence,
        layout,
        iiif_url,
    );
    migration.run(&mut writer, on_event)
}
