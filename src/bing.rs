//! # Bing Archive Client
//!
//! Handles communication with the Bing Homepage Image Archive API to
//! enumerate the daily wallpaper images and retrieve image bytes.
//!
//! ## API Endpoint
//! The archive is queried at:
//! ```text
//! https://www.bing.com/HPImageArchive.aspx?format=js&idx=<i>&n=1&mkt=<market>
//! ```
//!
//! Parameters:
//! - `format=js`: return a JSON response
//! - `idx=<i>`: archive index (0 = today, 1 = yesterday, ...)
//! - `n=1`: one image per page
//! - `mkt=<market>`: regional market code (e.g. "en-US")
//!
//! The archive only keeps roughly the last eight days. Querying past its end
//! returns an empty `images` array; that is the normal exhaustion signal,
//! not an error.
//!
//! ## Image URLs
//! The API returns partial URLs that need the Bing host prepended. Appending
//! `&pid=hp&w=<W>&h=<H>` to a full image URL selects a resized rendition,
//! which is how thumbnails are fetched.

use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;

/// Host prepended to the relative image URLs returned by the archive.
pub const BING_BASE_URL: &str = "https://www.bing.com";

/// Query path of the image archive endpoint, relative to the base URL.
const ARCHIVE_PATH: &str = "/HPImageArchive.aspx";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Width of the thumbnail rendition requested for previews.
const THUMBNAIL_WIDTH: u32 = 120;

/// Height of the thumbnail rendition requested for previews.
const THUMBNAIL_HEIGHT: u32 = 80;

/// Creates the HTTP client used for all archive and image requests.
pub fn create_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;
    Ok(client)
}

/// One page of the archive response.
///
/// Some error pages omit the `images` field entirely; the default keeps that
/// indistinguishable from an empty page.
#[derive(Debug, Deserialize)]
struct ArchivePage {
    #[serde(default)]
    images: Vec<ArchiveImage>,
}

/// Raw image descriptor as returned by the archive.
///
/// Maps directly to the JSON structure; `enddate` is renamed to match Rust
/// naming conventions.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveImage {
    /// Partial URL path (needs the archive base URL prepended)
    pub url: String,
    /// Image title
    pub title: String,
    /// Date the image was featured, format `YYYYMMDD`
    #[serde(rename = "enddate")]
    pub end_date: String,
}

/// Fetches one page of the image archive.
///
/// A page carries at most one image. `Ok(None)` means the archive has no
/// entry at this index; older pages do not exist and a scan ends normally.
///
/// # Errors
/// [`Error::Network`](crate::Error::Network) on transport failures and
/// non-success statuses, [`Error::Decode`](crate::Error::Decode) when the
/// body is not the expected JSON shape. A single attempt is made per call.
pub async fn fetch_archive_page(
    client: &reqwest::Client,
    base_url: &str,
    index: usize,
    market: &str,
) -> Result<Option<ArchiveImage>> {
    let url = format!("{base_url}{ARCHIVE_PATH}?format=js&idx={index}&n=1&mkt={market}");
    tracing::debug!(%url, "fetching archive page");

    // Body is read as text and decoded separately so transport and decode
    // failures stay distinguishable.
    let body = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let page: ArchivePage = serde_json::from_str(&body)?;
    Ok(page.images.into_iter().next())
}

/// Builds the absolute image URL from the archive's relative path.
pub fn full_image_url(base_url: &str, relative: &str) -> String {
    format!("{base_url}{relative}")
}

/// Fetches the thumbnail rendition of an image.
pub async fn fetch_thumbnail(client: &reqwest::Client, image_url: &str) -> Result<Vec<u8>> {
    let url = format!("{image_url}&pid=hp&w={THUMBNAIL_WIDTH}&h={THUMBNAIL_HEIGHT}");
    fetch_image_bytes(client, &url).await
}

/// Fetches raw image bytes from an absolute URL.
pub async fn fetch_image_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes.to_vec())
}
