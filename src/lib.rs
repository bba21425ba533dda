//! # bingwall
//!
//! Library for discovering and downloading Bing's daily wallpaper images.
//!
//! The Bing homepage archive keeps roughly the last eight days of images. A
//! scan walks archive indices 0 through 7 (most recent first), derives the
//! canonical destination filename for each image, and marks the ones not yet
//! present in the target directory as selected. The caller adjusts the
//! selection and hands the list to a download pass, which fetches the
//! full-resolution images one by one and isolates per-item failures.
//!
//! ## Design
//! - **Library-first**: no CLI or UI. A presentation surface subscribes to
//!   the [`Event`] stream and triggers operations on a [`Session`].
//! - **Strictly sequential**: one archive page in flight at a time, one
//!   download at a time, emission order preserved.
//! - **Cooperatively cancellable**: a scan stops at iteration boundaries and
//!   in-flight requests are never aborted. Downloads do not cancel.
//!
//! ## Quick Start
//! ```no_run
//! use bingwall::{Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load();
//!     let session = Session::new()?;
//!
//!     // Subscribe to events
//!     let mut events = session.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{event:?}");
//!         }
//!     });
//!
//!     let market = bingwall::config::detect_market();
//!     let result = session.scan(&market, &config.wallpaper_dir).await?;
//!
//!     // Normally the user tweaks the selection here.
//!     let mut items = result.items;
//!     let report = session.download(&mut items, &config.wallpaper_dir).await?;
//!     println!("{} saved, {} failed", report.succeeded, report.failed());
//!     Ok(())
//! }
//! ```

/// Bing archive client
pub mod bing;
/// Settings persistence and market detection
pub mod config;
/// Download orchestrator
pub mod download;
/// Error types
pub mod error;
/// Scan orchestrator
pub mod scan;
/// Session facade and operation serialization
pub mod session;
/// Filename derivation and target-directory access
pub mod storage;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use download::{DownloadFailure, DownloadReport};
pub use error::{Error, Result};
pub use scan::{ScanOutcome, ScanResult};
pub use session::Session;
pub use types::{DiscoveredWallpaper, Event};
