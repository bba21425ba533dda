//! # Download Orchestrator
//!
//! Fetches the selected full-resolution images one at a time and writes
//! them into the target directory. A failing item is recorded and skipped;
//! the remaining items still get their turn, and the aggregate report
//! carries the per-item detail. Downloads are not cancellable.

use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

use crate::bing;
use crate::error::{Error, Result};
use crate::storage;
use crate::types::{emit, DiscoveredWallpaper, Event};

/// A single item that could not be downloaded.
#[derive(Debug)]
pub struct DownloadFailure {
    /// Title of the failed item
    pub title: String,
    /// Destination filename that was not written
    pub filename: String,
    /// What went wrong (fetch or write)
    pub error: Error,
}

/// Aggregate result of one download pass.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Number of images written to the target directory
    pub succeeded: usize,
    /// Per-item detail for everything that failed
    pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    /// Number of items that failed and stayed selected.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Downloads every item whose `selected` flag is set.
///
/// Strictly sequential. Each success clears the item's `selected` flag and
/// counts toward the report; each failure leaves the flag set and is
/// recorded without aborting the remaining items. With nothing selected the
/// pass is a no-op and no event is emitted.
pub(crate) async fn run(
    client: &reqwest::Client,
    items: &mut [DiscoveredWallpaper],
    target_dir: &Path,
    events: &broadcast::Sender<Event>,
) -> DownloadReport {
    let mut report = DownloadReport::default();

    if !items.iter().any(|item| item.selected) {
        return report;
    }

    for item in items.iter_mut().filter(|item| item.selected) {
        let filename = storage::derive_filename(&item.date, &item.title);
        match download_one(client, &item.full_image_url, target_dir, &filename).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "image saved");
                item.selected = false;
                report.succeeded += 1;
            }
            Err(error) => {
                // Isolation: record the failure and move on to the next item.
                tracing::warn!(title = %item.title, error = %error, "download failed");
                report.failures.push(DownloadFailure {
                    title: item.title.clone(),
                    filename,
                    error,
                });
            }
        }
    }

    emit(
        events,
        Event::DownloadFinished {
            saved: report.succeeded,
            failed: report.failed(),
        },
    );
    report
}

/// Fetches one full image and writes it, overwriting an existing file.
async fn download_one(
    client: &reqwest::Client,
    url: &str,
    target_dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let bytes = bing::fetch_image_bytes(client, url).await?;
    storage::write_image(target_dir, filename, &bytes)
}
