//! Error types for bingwall.
//!
//! One enum covers the whole crate. Transport and decode failures abort a
//! running scan; filesystem failures during a download are recorded per item
//! and never abort the pass; the session-state variants enforce the
//! one-operation-at-a-time rule.

use thiserror::Error;

/// Result type alias for bingwall operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bingwall.
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure, timeout, or non-success HTTP status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The archive returned a body that is not the expected JSON shape.
    #[error("malformed archive response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Filesystem failure while writing an image or saving settings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be located or serialized.
    #[error("configuration error: {0}")]
    Config(String),

    /// A scan is running. A rejected scan request has already asked the
    /// running one to cancel; a rejected download request has not.
    #[error("a scan is in progress")]
    ScanInProgress,

    /// A download is running; downloads cannot be cancelled or overlapped.
    #[error("a download is in progress")]
    DownloadInProgress,
}
