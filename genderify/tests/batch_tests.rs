//! Integration tests for batch sessions
//!
//! Checkpointing, resume after cancellation and playlist batches.

mod helpers;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use genderify::db::checkpoints::count_checkpoints;
use genderify::services::BatchOrigin;
use genderify::{BatchSession, CacheStore, GenderLabel, ResolveError};
use helpers::*;

const ARTISTS: &[&str] = &["Alpha", "Bravo", "Charlie", "Delta"];

#[tokio::test]
async fn test_checkpoint_after_every_artist() {
    let fetcher = Arc::new(
        FakeFetcher::new().page(wiki_url("Bravo"), wiki_person("Bravo is a singer. She sings.")),
    );
    let mut genderifier = genderifier(fetcher).await;
    let mut session = BatchSession::new(Arc::new(FakeCatalog::with_artists(ARTISTS)), 3);

    let filled = session.fill_batch(genderifier.store(), None).await.unwrap();
    assert_eq!(filled, 3);
    assert_eq!(session.origin(), Some(&BatchOrigin::Search { offset: 0 }));

    let summary = session
        .run_batch(&mut genderifier, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.next_offset, Some(3));
    assert_eq!(summary.results[1].gender, Some(GenderLabel::Female));
    let store = genderifier.store();
    assert_eq!(store.latest_offset().await.unwrap(), 3);
    assert_eq!(count_checkpoints(store.pool()).await.unwrap(), 3);
    assert!(session.pending().is_empty());
}

#[tokio::test]
async fn test_resume_after_cancel_restarts_at_interrupted_artist() {
    let cancel = CancellationToken::new();
    let fetcher = Arc::new(FakeFetcher::new().stall_and_cancel(wiki_url("Charlie"), cancel.clone()));
    let catalog = Arc::new(FakeCatalog::with_artists(ARTISTS));
    let mut genderifier = genderifier(fetcher.clone()).await;

    let mut session = BatchSession::new(catalog.clone(), 10);
    session.fill_batch(genderifier.store(), Some(0)).await.unwrap();
    let err = session.run_batch(&mut genderifier, &cancel).await.unwrap_err();

    assert!(matches!(err, ResolveError::Cancelled));
    assert_eq!(genderifier.store().latest_offset().await.unwrap(), 2);
    assert_eq!(genderifier.depth(), 0);

    // Re-run picks up from the checkpoint
    let mut resumed = BatchSession::new(catalog.clone(), 10);
    let filled = resumed.fill_batch(genderifier.store(), None).await.unwrap();
    assert_eq!(filled, 2);
    assert_eq!(resumed.pending()[0].name, "Charlie");

    let summary = resumed
        .run_batch(&mut genderifier, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.next_offset, Some(4));
    assert_eq!(fetcher.requests_for(&wiki_url("Alpha")), 1);
    assert_eq!(fetcher.requests_for(&wiki_url("Bravo")), 1);
    assert_eq!(fetcher.requests_for(&wiki_url("Charlie")), 2);
    assert_eq!(catalog.searches(), vec![(0, 10), (2, 10)]);
}

#[tokio::test]
async fn test_cancel_before_first_artist_keeps_offset() {
    let fetcher = Arc::new(FakeFetcher::new());
    let mut genderifier = genderifier(fetcher.clone()).await;
    let mut session = BatchSession::new(Arc::new(FakeCatalog::with_artists(ARTISTS)), 10);
    session.fill_batch(genderifier.store(), Some(1)).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = session.run_batch(&mut genderifier, &cancel).await.unwrap_err();

    assert!(matches!(err, ResolveError::Cancelled));
    assert_eq!(fetcher.request_count(), 0);
    assert_eq!(genderifier.store().latest_offset().await.unwrap(), 1);
}

#[tokio::test]
async fn test_explicit_offset_overrides_checkpoint() {
    let store = CacheStore::in_memory().await.unwrap();
    store.record_offset(3).await.unwrap();
    let catalog = Arc::new(FakeCatalog::with_artists(ARTISTS));
    let mut session = BatchSession::new(catalog.clone(), 2);

    session.fill_batch(&store, Some(1)).await.unwrap();

    let names: Vec<&str> = session.pending().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Bravo", "Charlie"]);
    assert_eq!(session.pending()[0].catalog_id.as_deref(), Some("artist-1"));
    assert_eq!(catalog.searches(), vec![(1, 2)]);
}

#[tokio::test]
async fn test_past_the_end_yields_empty_batch() {
    let store = CacheStore::in_memory().await.unwrap();
    let mut session = BatchSession::new(Arc::new(FakeCatalog::with_artists(ARTISTS)), 10);

    assert_eq!(session.fill_batch(&store, Some(4)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_upstream_error_surfaces_message() {
    let store = CacheStore::in_memory().await.unwrap();
    let mut session = BatchSession::new(Arc::new(FakeCatalog::failing("The access token expired")), 10);

    let err = session.fill_batch(&store, None).await.unwrap_err();

    assert!(matches!(err, ResolveError::UpstreamApi(_)));
    assert_eq!(err.to_string(), "Catalog API error: The access token expired");
}

#[tokio::test]
async fn test_playlist_batch_deduplicated_without_checkpoints() {
    let catalog = FakeCatalog::with_playlist(&[&["Alpha", "Bravo"], &["Alpha"], &["Charlie"]]);
    let fetcher = Arc::new(FakeFetcher::new());
    let mut genderifier = genderifier(fetcher).await;
    let mut session = BatchSession::new(Arc::new(catalog), 10);

    let filled = session
        .fill_batch_from_playlist("https://open.spotify.com/playlist/37i9dQZF1DX4JAvHpjipBk?si=abc")
        .await
        .unwrap();

    assert_eq!(filled, 3);
    let names: Vec<&str> = session.pending().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);
    assert_eq!(
        session.origin(),
        Some(&BatchOrigin::Playlist {
            playlist_id: "37i9dQZF1DX4JAvHpjipBk".to_string()
        })
    );

    let summary = session
        .run_batch(&mut genderifier, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.next_offset, None);
    assert_eq!(count_checkpoints(genderifier.store().pool()).await.unwrap(), 0);
    assert_eq!(genderifier.report().unresolved, 3);
}
