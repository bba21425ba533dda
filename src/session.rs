//! # Session
//!
//! Ties the pieces together for a presentation surface: one HTTP client,
//! one event channel, and the rule that at most one scan or download runs
//! at a time. The surface subscribes to events, triggers operations, and
//! owns the discovered list between them.
//!
//! The single-operation rule mirrors the observed scan-button toggle: a
//! scan request while a scan is running turns into a cancellation request
//! for the running one. Downloads have no cancellation path at all.

use std::path::Path;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bing::{self, BING_BASE_URL};
use crate::download::{self, DownloadReport};
use crate::error::{Error, Result};
use crate::scan::{self, ScanResult};
use crate::types::{DiscoveredWallpaper, Event};

/// Buffered events per subscriber; slow consumers lose the oldest first.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What the session is doing right now.
enum ActiveOp {
    Idle,
    /// A scan is running; the token cancels it at its next checkpoint.
    Scanning(CancellationToken),
    /// A download is running; it cannot be cancelled.
    Downloading,
}

/// One user-facing session.
///
/// Owns the HTTP client and the event channel, and serializes operations so
/// the discovered list is never mutated while a scan produces it.
pub struct Session {
    client: reqwest::Client,
    base_url: String,
    events: broadcast::Sender<Event>,
    active: Mutex<ActiveOp>,
}

impl Session {
    /// Creates a session against the real Bing archive.
    pub fn new() -> Result<Self> {
        Self::with_base_url(BING_BASE_URL)
    }

    /// Creates a session against an alternate archive host.
    ///
    /// The base URL is prepended to the relative image paths the archive
    /// returns, exactly like the real host. Tests point this at a local
    /// server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            client: bing::create_client()?,
            base_url: base_url.into(),
            events,
            active: Mutex::new(ActiveOp::Idle),
        })
    }

    /// Subscribes to the session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Requests cancellation of a running scan.
    ///
    /// Cooperative: the scan stops at its next iteration boundary, after any
    /// in-flight request has completed. A no-op when no scan is running.
    pub fn cancel_scan(&self) {
        if let ActiveOp::Scanning(token) = &*self.state() {
            token.cancel();
        }
    }

    /// Runs one scan session to a terminal state.
    ///
    /// Returns the ordered list of discovered wallpapers together with the
    /// terminal [`ScanOutcome`](crate::ScanOutcome); items found before a
    /// cancellation or failure are retained in the result.
    ///
    /// # Errors
    /// [`Error::ScanInProgress`] when a scan is already running. That scan
    /// has been asked to cancel, so a button wired to this method behaves as
    /// a start/stop toggle. [`Error::DownloadInProgress`] when a download is
    /// running; nothing is cancelled in that case.
    pub async fn scan(&self, market: &str, target_dir: &Path) -> Result<ScanResult> {
        let token = CancellationToken::new();
        {
            let mut active = self.state();
            match &*active {
                ActiveOp::Scanning(running) => {
                    running.cancel();
                    return Err(Error::ScanInProgress);
                }
                ActiveOp::Downloading => return Err(Error::DownloadInProgress),
                ActiveOp::Idle => {}
            }
            *active = ActiveOp::Scanning(token.clone());
        }

        let result = scan::run(
            &self.client,
            &self.base_url,
            market,
            target_dir,
            &self.events,
            &token,
        )
        .await;

        *self.state() = ActiveOp::Idle;
        Ok(result)
    }

    /// Runs one download pass over the selected items.
    ///
    /// Only entries with `selected == true` are fetched; their flags are
    /// cleared on success. See [`DownloadReport`] for the aggregate result.
    ///
    /// # Errors
    /// [`Error::ScanInProgress`] or [`Error::DownloadInProgress`] while
    /// another operation is active; the discovered list must not change
    /// under a running scan, and downloads never overlap.
    pub async fn download(
        &self,
        items: &mut [DiscoveredWallpaper],
        target_dir: &Path,
    ) -> Result<DownloadReport> {
        {
            let mut active = self.state();
            match &*active {
                ActiveOp::Scanning(_) => return Err(Error::ScanInProgress),
                ActiveOp::Downloading => return Err(Error::DownloadInProgress),
                ActiveOp::Idle => {}
            }
            *active = ActiveOp::Downloading;
        }

        let report = download::run(&self.client, items, target_dir, &self.events).await;

        *self.state() = ActiveOp::Idle;
        Ok(report)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ActiveOp> {
        // The lock is only held across state checks, never across awaits,
        // and no holder can panic.
        self.active.lock().expect("session state lock poisoned")
    }
}
