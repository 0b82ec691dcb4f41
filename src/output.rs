//! CLI output formatting for a migration run.
//!
//! Progress is **item-centric**: each item leads with its Omeka id and title,
//! its pages follow as indented lines naming the source file, and the item
//! closes with where its manifest went (or why it didn't get one).
//!
//! ```text
//! 012 Harbour at dusk
//!     001 harbour-1.jpg
//!         download: cached
//!         tiles: generated
//!     skipped harbour-2.tif: unsupported image ...
//!     002 harbour-3.jpg
//!         download: downloaded
//!         tiles: cached
//!     → /manifests/12.json
//! ```
//!
//! Each `format_*` function returns lines for testability; the `print_*`
//! wrappers write them to stdout. Diagnostics go through `tracing` on stderr
//! and never mix with these lines.

use crate::cache::CacheStatus;
use crate::migrate::{MigrateEvent, MigrateSummary};

/// Format a positional index or id as 3-digit zero-padded.
fn format_index(pos: u64) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Last path segment of a source URL, for compact display.
fn file_name(source: &str) -> &str {
    source
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(source)
}

fn status_label(status: CacheStatus, produced: &'static str) -> &'static str {
    match status {
        CacheStatus::Cached => "cached",
        CacheStatus::Produced => produced,
    }
}

/// Format one progress event.
pub fn format_migrate_event(event: &MigrateEvent) -> Vec<String> {
    match event {
        MigrateEvent::ItemStarted { item_id, title } => {
            vec![format!("{} {}", format_index(*item_id), title)]
        }
        MigrateEvent::PageAdded {
            page,
            source,
            download,
            tiles,
        } => vec![
            format!(
                "{}{} {}",
                indent(1),
                format_index(u64::from(*page)),
                file_name(source)
            ),
            format!(
                "{}download: {}",
                indent(2),
                status_label(*download, "downloaded")
            ),
            format!("{}tiles: {}", indent(2), status_label(*tiles, "generated")),
        ],
        MigrateEvent::FileSkipped { source, reason } => {
            vec![format!(
                "{}skipped {}: {}",
                indent(1),
                file_name(source),
                reason
            )]
        }
        MigrateEvent::ManifestWritten { uri, .. } => {
            vec![format!("{}\u{2192} {}", indent(1), uri)]
        }
        MigrateEvent::ItemDiscarded { .. } => {
            vec![format!("{}no usable images, no manifest", indent(1))]
        }
    }
}

pub fn print_migrate_event(event: &MigrateEvent) {
    for line in format_migrate_event(event) {
        println!("{}", line);
    }
}

/// Format the end-of-run summary.
///
/// ```text
/// Migrated 3 items: 2 manifests, 1 discarded
/// Pages: 7 (1 file skipped)
/// Downloads: 5 cached, 3 new (8 total)
/// Tiles: 2 new
/// ```
pub fn format_summary(summary: &MigrateSummary) -> Vec<String> {
    let plural = |n: u32, word: &str| {
        if n == 1 {
            format!("{} {}", n, word)
        } else {
            format!("{} {}s", n, word)
        }
    };

    let mut lines = vec![format!(
        "Migrated {}: {}, {} discarded",
        plural(summary.items, "item"),
        plural(summary.manifests_written, "manifest"),
        summary.items_discarded
    )];
    if summary.files_skipped > 0 {
        lines.push(format!(
            "Pages: {} ({} skipped)",
            summary.pages,
            plural(summary.files_skipped, "file")
        ));
    } else {
        lines.push(format!("Pages: {}", summary.pages));
    }
    lines.push(format!("Downloads: {}", summary.downloads));
    lines.push(format!("Tiles: {}", summary.tiles));
    lines
}

pub fn print_summary(summary: &MigrateSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
