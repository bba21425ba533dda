//! # Scan Orchestrator
//!
//! Drives the cancellable walk over the archive indices. The loop is
//! strictly sequential: one page is fetched, processed and emitted before
//! the next fetch begins, preserving increasing index order (index 0 is the
//! most recent day). Cancellation is honored only at iteration boundaries,
//! so an in-flight request always completes.

use std::path::Path;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bing;
use crate::error::Error;
use crate::storage;
use crate::types::{emit, DiscoveredWallpaper, Event};

/// Highest archive index queried; the archive keeps roughly eight days.
const MAX_ARCHIVE_INDEX: usize = 7;

/// Terminal state of a scan session.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The full index range was processed or the archive ran out of pages
    Completed,
    /// A cancellation request was honored at an iteration boundary
    Cancelled,
    /// An archive page could not be fetched or decoded
    Failed(Error),
}

/// Everything a scan session produced.
///
/// Items discovered before a cancellation or failure are retained; the
/// caller owns the list from here on.
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered wallpapers in increasing index order (most recent first)
    pub items: Vec<DiscoveredWallpaper>,
    /// How the session ended
    pub outcome: ScanOutcome,
}

/// Runs one scan session to a terminal state.
///
/// Per index: check the cancellation token, fetch the archive page, derive
/// the destination filename, snapshot local presence into the `selected`
/// flag, fetch the thumbnail (non-fatal), then emit the item. An empty page
/// completes the session early; a fetch or decode failure ends it with
/// [`ScanOutcome::Failed`].
pub(crate) async fn run(
    client: &reqwest::Client,
    base_url: &str,
    market: &str,
    target_dir: &Path,
    events: &broadcast::Sender<Event>,
    cancel: &CancellationToken,
) -> ScanResult {
    let mut items: Vec<DiscoveredWallpaper> = Vec::new();

    for index in 0..=MAX_ARCHIVE_INDEX {
        // Cancellation checkpoint. A request that arrived mid-fetch takes
        // effect here, after the in-flight call completed.
        if cancel.is_cancelled() {
            tracing::info!(discovered = items.len(), "scan cancelled");
            emit(
                events,
                Event::ScanCancelled {
                    discovered: items.len(),
                },
            );
            return ScanResult {
                items,
                outcome: ScanOutcome::Cancelled,
            };
        }

        let image = match bing::fetch_archive_page(client, base_url, index, market).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                // No image at this index: the archive has no older entries.
                emit(
                    events,
                    Event::ScanCompleted {
                        discovered: items.len(),
                    },
                );
                return ScanResult {
                    items,
                    outcome: ScanOutcome::Completed,
                };
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "scan aborted");
                emit(
                    events,
                    Event::ScanFailed {
                        error: e.to_string(),
                    },
                );
                return ScanResult {
                    items,
                    outcome: ScanOutcome::Failed(e),
                };
            }
        };

        let full_image_url = bing::full_image_url(base_url, &image.url);
        let filename = storage::derive_filename(&image.end_date, &image.title);
        let selected = !storage::is_present(target_dir, &filename);

        // A missing thumbnail is not worth aborting the session over; the
        // item is still emitted, just without a preview.
        let thumbnail = match bing::fetch_thumbnail(client, &full_image_url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(title = %image.title, error = %e, "thumbnail fetch failed");
                None
            }
        };

        let item = DiscoveredWallpaper {
            full_image_url,
            title: image.title,
            date: image.end_date,
            selected,
            thumbnail,
        };
        items.push(item.clone());
        emit(events, Event::ItemDiscovered { item });
    }

    emit(
        events,
        Event::ScanCompleted {
            discovered: items.len(),
        },
    );
    ScanResult {
        items,
        outcome: ScanOutcome::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_body(index: usize) -> String {
        format!(
            r#"{{"images":[{{"url":"/th?id=OHR.Test{index}","title":"Test image {index}","enddate":"2024011{index}"}}]}}"#
        )
    }

    async fn mount_pages(server: &MockServer, with_images: usize) {
        for index in 0..with_images {
            Mock::given(method("GET"))
                .and(path("/HPImageArchive.aspx"))
                .and(query_param("idx", index.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_string(page_body(index)))
                .mount(server)
                .await;
        }
        for index in with_images..=MAX_ARCHIVE_INDEX {
            Mock::given(method("GET"))
                .and(path("/HPImageArchive.aspx"))
                .and(query_param("idx", index.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"images":[]}"#))
                .mount(server)
                .await;
        }
    }

    async fn mount_thumbnails(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/th"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
            .mount(server)
            .await;
    }

    fn test_events() -> (broadcast::Sender<Event>, broadcast::Receiver<Event>) {
        broadcast::channel(64)
    }

    #[tokio::test]
    async fn scan_stops_at_the_first_empty_page() {
        let server = MockServer::start().await;
        mount_pages(&server, 3).await;
        mount_thumbnails(&server).await;

        let dir = TempDir::new().unwrap();
        let client = bing::create_client().unwrap();
        let (tx, mut rx) = test_events();
        let cancel = CancellationToken::new();

        let result = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        assert!(matches!(result.outcome, ScanOutcome::Completed));
        assert_eq!(result.items.len(), 3);

        // Increasing index order, all pre-selected against an empty
        // directory, thumbnails attached.
        for (index, item) in result.items.iter().enumerate() {
            assert_eq!(item.title, format!("Test image {index}"));
            assert!(item.full_image_url.ends_with(&format!("/th?id=OHR.Test{index}")));
            assert!(item.selected);
            assert!(item.thumbnail.is_some());
        }

        // Event stream: three discoveries, then completion.
        for index in 0..3 {
            match rx.try_recv().unwrap() {
                Event::ItemDiscovered { item } => {
                    assert_eq!(item.title, format!("Test image {index}"));
                }
                other => panic!("expected ItemDiscovered, got {other:?}"),
            }
        }
        assert!(matches!(
            rx.try_recv().unwrap(),
            Event::ScanCompleted { discovered: 3 }
        ));
    }

    #[tokio::test]
    async fn scan_completes_after_the_full_index_range() {
        let server = MockServer::start().await;
        mount_pages(&server, MAX_ARCHIVE_INDEX + 1).await;
        mount_thumbnails(&server).await;

        let dir = TempDir::new().unwrap();
        let client = bing::create_client().unwrap();
        let (tx, _rx) = test_events();
        let cancel = CancellationToken::new();

        let result = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        assert!(matches!(result.outcome, ScanOutcome::Completed));
        assert_eq!(result.items.len(), MAX_ARCHIVE_INDEX + 1);
    }

    #[tokio::test]
    async fn already_downloaded_items_are_not_selected() {
        let server = MockServer::start().await;
        mount_pages(&server, 3).await;
        mount_thumbnails(&server).await;

        let dir = TempDir::new().unwrap();
        // Item 1's canonical file is already on disk.
        let existing = storage::derive_filename("20240111", "Test image 1");
        std::fs::write(dir.path().join(&existing), b"jpeg").unwrap();

        let client = bing::create_client().unwrap();
        let (tx, _rx) = test_events();
        let cancel = CancellationToken::new();

        let result = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        let selected: Vec<bool> = result.items.iter().map(|i| i.selected).collect();
        assert_eq!(selected, vec![true, false, true]);
    }

    #[tokio::test]
    async fn rescan_flips_selection_once_a_file_appears() {
        let server = MockServer::start().await;
        mount_pages(&server, 3).await;
        mount_thumbnails(&server).await;

        let dir = TempDir::new().unwrap();
        let client = bing::create_client().unwrap();
        let (tx, _rx) = test_events();
        let cancel = CancellationToken::new();

        let first = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;
        assert!(first.items.iter().all(|i| i.selected));

        // Simulate downloading item 0 between the two runs.
        let filename = storage::derive_filename(&first.items[0].date, &first.items[0].title);
        storage::write_image(dir.path(), &filename, b"jpeg").unwrap();

        let second = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        assert_eq!(second.items.len(), first.items.len());
        for (a, b) in first.items.iter().zip(&second.items) {
            assert_eq!(a.full_image_url, b.full_image_url);
            assert_eq!(a.title, b.title);
            assert_eq!(a.date, b.date);
        }
        let selected: Vec<bool> = second.items.iter().map(|i| i.selected).collect();
        assert_eq!(selected, vec![false, true, true]);
    }

    #[tokio::test]
    async fn pre_cancelled_scan_makes_no_archive_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/HPImageArchive.aspx"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_body(0)))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = bing::create_client().unwrap();
        let (tx, mut rx) = test_events();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        assert!(matches!(result.outcome, ScanOutcome::Cancelled));
        assert!(result.items.is_empty());
        assert!(matches!(
            rx.try_recv().unwrap(),
            Event::ScanCancelled { discovered: 0 }
        ));
        server.verify().await;
    }

    #[tokio::test]
    async fn cancellation_mid_fetch_takes_effect_at_the_next_boundary() {
        let server = MockServer::start().await;
        for index in 0..2 {
            Mock::given(method("GET"))
                .and(path("/HPImageArchive.aspx"))
                .and(query_param("idx", index.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_string(page_body(index)))
                .mount(&server)
                .await;
        }
        // Index 2 is slow; the cancellation request lands while this fetch
        // is in flight, so the item is still processed.
        Mock::given(method("GET"))
            .and(path("/HPImageArchive.aspx"))
            .and(query_param("idx", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page_body(2))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
        // Index 3 must never be queried.
        Mock::given(method("GET"))
            .and(path("/HPImageArchive.aspx"))
            .and(query_param("idx", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_body(3)))
            .expect(0)
            .mount(&server)
            .await;
        mount_thumbnails(&server).await;

        let dir = TempDir::new().unwrap();
        let target: PathBuf = dir.path().to_path_buf();
        let client = bing::create_client().unwrap();
        let base = server.uri();
        let (tx, _rx) = test_events();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run(&client, &base, "en-US", &target, &tx, &task_cancel).await
        });

        // Let the scan reach the delayed index-2 fetch, then cancel.
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();

        let result = handle.await.unwrap();

        assert!(matches!(result.outcome, ScanOutcome::Cancelled));
        assert_eq!(result.items.len(), 3);
        server.verify().await;
    }

    #[tokio::test]
    async fn archive_failure_aborts_and_keeps_earlier_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/HPImageArchive.aspx"))
            .and(query_param("idx", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_body(0)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/HPImageArchive.aspx"))
            .and(query_param("idx", "1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_thumbnails(&server).await;

        let dir = TempDir::new().unwrap();
        let client = bing::create_client().unwrap();
        let (tx, mut rx) = test_events();
        let cancel = CancellationToken::new();

        let result = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        assert!(matches!(result.outcome, ScanOutcome::Failed(Error::Network(_))));
        assert_eq!(result.items.len(), 1);

        assert!(matches!(rx.try_recv().unwrap(), Event::ItemDiscovered { .. }));
        match rx.try_recv().unwrap() {
            Event::ScanFailed { error } => assert!(error.starts_with("network error")),
            other => panic!("expected ScanFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn thumbnail_failure_is_non_fatal() {
        let server = MockServer::start().await;
        mount_pages(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/th"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = bing::create_client().unwrap();
        let (tx, _rx) = test_events();
        let cancel = CancellationToken::new();

        let result = run(&client, &server.uri(), "en-US", dir.path(), &tx, &cancel).await;

        assert!(matches!(result.outcome, ScanOutcome::Completed));
        assert_eq!(result.items.len(), 1);
        assert!(result.items[0].thumbnail.is_none());
        assert!(result.items[0].selected);
    }
}
