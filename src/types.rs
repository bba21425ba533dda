//! Core types and the event stream.
//!
//! The core exposes plain data plus discrete events; a presentation layer
//! subscribes and renders. Thumbnail bytes travel inside the events, so any
//! decoding for display happens entirely on the consumer side, on whatever
//! thread the consumer requires.

use tokio::sync::broadcast;

/// A wallpaper discovered during a scan, ready for selection and download.
#[derive(Debug, Clone)]
pub struct DiscoveredWallpaper {
    /// Absolute URL of the full-resolution image
    pub full_image_url: String,
    /// Image title
    pub title: String,
    /// Date the image was featured, format `YYYYMMDD`
    pub date: String,
    /// Queued for download. True at discovery time iff the derived filename
    /// was not present in the target directory; cleared after a successful
    /// download. The presence snapshot is not re-checked at download time.
    pub selected: bool,
    /// Raw bytes of the preview rendition, when the thumbnail fetch succeeded
    pub thumbnail: Option<Vec<u8>>,
}

/// Events emitted over a session's broadcast channel.
///
/// Exactly one of the scan-terminal events (`ScanCompleted`, `ScanCancelled`,
/// `ScanFailed`) follows the `ItemDiscovered` sequence of each scan.
#[derive(Debug, Clone)]
pub enum Event {
    /// A wallpaper was discovered and appended to the scan's result list
    ItemDiscovered {
        /// The discovered wallpaper, including its pre-computed selection
        item: DiscoveredWallpaper,
    },
    /// The scan processed the full index range or ran out of archive pages
    ScanCompleted {
        /// Number of wallpapers the session discovered
        discovered: usize,
    },
    /// The scan stopped at a cancellation checkpoint
    ScanCancelled {
        /// Number of wallpapers discovered before the checkpoint
        discovered: usize,
    },
    /// The scan aborted on an archive fetch or decode failure
    ScanFailed {
        /// Human-readable description of the failure
        error: String,
    },
    /// A download pass over the selected items finished
    DownloadFinished {
        /// Number of images written to the target directory
        saved: usize,
        /// Number of items that failed and stayed selected
        failed: usize,
    },
}

/// Sends an event to all subscribers.
///
/// If there are no active subscribers the event is silently dropped, so the
/// workflow continues even when nobody is listening.
pub(crate) fn emit(events: &broadcast::Sender<Event>, event: Event) {
    events.send(event).ok();
}
