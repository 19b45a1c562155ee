//! Batch Session Manager
//!
//! Pulls artist identities from the catalog and feeds them, in order, to the
//! [`Genderifier`]. Search batches checkpoint `offset + index + 1` after every
//! artist so an interrupted run resumes at the first unprocessed artist.

use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::CacheStore;
use crate::error::{ResolveError, ResolveResult};
use crate::models::{ArtistIdentity, ResolutionResult};
use crate::services::genderifier::Genderifier;
use crate::services::spotify_client::{parse_playlist_ref, ArtistCatalog, MAX_PAGE_LIMIT};

/// Where the pending batch came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOrigin {
    /// Catalog search page starting at `offset`
    Search { offset: u32 },
    Playlist { playlist_id: String },
}

/// Outcome of one `run_batch`
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: usize,
    /// Offset of the first artist not yet processed (search batches only)
    pub next_offset: Option<u32>,
    pub results: Vec<ResolutionResult>,
}

pub struct BatchSession {
    catalog: Arc<dyn ArtistCatalog>,
    batch_limit: u32,
    pending: Vec<ArtistIdentity>,
    origin: Option<BatchOrigin>,
    session_id: Uuid,
}

impl BatchSession {
    /// `batch_limit` is clamped to `1..=MAX_PAGE_LIMIT`
    pub fn new(catalog: Arc<dyn ArtistCatalog>, batch_limit: u32) -> Self {
        let session_id = Uuid::new_v4();
        let batch_limit = batch_limit.clamp(1, MAX_PAGE_LIMIT);
        info!(session_id = %session_id, batch_limit, "Starting batch session");

        Self {
            catalog,
            batch_limit,
            pending: Vec::new(),
            origin: None,
            session_id,
        }
    }

    pub fn pending(&self) -> &[ArtistIdentity] {
        &self.pending
    }

    pub fn origin(&self) -> Option<&BatchOrigin> {
        self.origin.as_ref()
    }

    /// Load one search page
    ///
    /// Starts at `offset` when given, else at the latest checkpoint. Returns
    /// the number of identities now pending.
    pub async fn fill_batch(&mut self, store: &CacheStore, offset: Option<u32>) -> ResolveResult<usize> {
        let offset = match offset {
            Some(offset) => offset,
            None => store.latest_offset().await?,
        };

        let page = self.catalog.search_artists(offset, self.batch_limit).await?;
        self.pending = page
            .items
            .into_iter()
            .map(|artist| ArtistIdentity::new(artist.name).with_catalog_id(artist.id))
            .collect();
        self.origin = Some(BatchOrigin::Search { offset });

        info!(
            session_id = %self.session_id,
            offset,
            count = self.pending.len(),
            "Filled batch from catalog search"
        );
        Ok(self.pending.len())
    }

    /// Load every distinct track artist of a playlist, in first-seen order
    pub async fn fill_batch_from_playlist(&mut self, reference: &str) -> ResolveResult<usize> {
        let playlist_id = parse_playlist_ref(reference)?;
        let playlist = self.catalog.playlist(&playlist_id).await?;

        info!(playlist = %playlist.name, "Playlist: {}", playlist.name);
        if let Some(description) = playlist.description.as_deref().filter(|d| !d.is_empty()) {
            info!(playlist = %playlist.name, "{}", description);
        }

        let mut seen = HashSet::new();
        self.pending = playlist
            .artists()
            .filter(|artist| seen.insert(artist.name.clone()))
            .map(|artist| ArtistIdentity::new(artist.name.clone()).with_catalog_id(artist.id.clone()))
            .collect();
        self.origin = Some(BatchOrigin::Playlist { playlist_id });

        info!(
            session_id = %self.session_id,
            count = self.pending.len(),
            "Filled batch from playlist"
        );
        Ok(self.pending.len())
    }

    /// Resolve every pending identity in order
    ///
    /// On cancellation the in-flight artist is abandoned, the checkpoint
    /// points at it, and `ResolveError::Cancelled` is returned.
    pub async fn run_batch(
        &mut self,
        genderifier: &mut Genderifier,
        cancel: &CancellationToken,
    ) -> ResolveResult<BatchSummary> {
        let pending = std::mem::take(&mut self.pending);
        let base_offset = match &self.origin {
            Some(BatchOrigin::Search { offset }) => Some(*offset),
            _ => None,
        };
        let mut summary = BatchSummary {
            next_offset: base_offset,
            ..Default::default()
        };

        for (ix, identity) in pending.into_iter().enumerate() {
            let position = base_offset.map(|offset| offset + ix as u32);

            if cancel.is_cancelled() {
                return self.cancelled(genderifier, position).await;
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = genderifier.genderise(identity) => Some(result),
            };
            let Some(result) = result else {
                return self.cancelled(genderifier, position).await;
            };

            if let Some(position) = position {
                let next = position + 1;
                if let Err(e) = genderifier.store().record_offset(next).await {
                    warn!(session_id = %self.session_id, offset = next, "Failed to checkpoint offset: {}", e);
                }
                summary.next_offset = Some(next);
            }
            summary.processed += 1;
            summary.results.push(result);
        }

        info!(
            session_id = %self.session_id,
            processed = summary.processed,
            next_offset = ?summary.next_offset,
            "Batch complete"
        );
        Ok(summary)
    }

    async fn cancelled(
        &self,
        genderifier: &mut Genderifier,
        position: Option<u32>,
    ) -> ResolveResult<BatchSummary> {
        genderifier.abandon_in_flight();
        if let Some(position) = position {
            if let Err(e) = genderifier.store().record_offset(position).await {
                warn!(session_id = %self.session_id, offset = position, "Failed to checkpoint offset: {}", e);
            }
        }
        warn!(session_id = %self.session_id, resume_offset = ?position, "Batch cancelled");
        Err(ResolveError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::spotify_client::{ArtistPage, CatalogArtist, CatalogError, Playlist};
    use async_trait::async_trait;

    struct EmptyCatalog;

    #[async_trait]
    impl ArtistCatalog for EmptyCatalog {
        async fn search_artists(&self, offset: u32, limit: u32) -> Result<ArtistPage, CatalogError> {
            Ok(ArtistPage {
                items: vec![CatalogArtist {
                    id: Some("id0".into()),
                    name: "Only".into(),
                }],
                limit,
                offset,
            })
        }

        async fn playlist(&self, _playlist_id: &str) -> Result<Playlist, CatalogError> {
            Err(CatalogError::ApiError("Invalid playlist Id".into()))
        }
    }

    #[test]
    fn test_batch_limit_clamped() {
        let session = BatchSession::new(Arc::new(EmptyCatalog), 500);
        assert_eq!(session.batch_limit, MAX_PAGE_LIMIT);
        let session = BatchSession::new(Arc::new(EmptyCatalog), 0);
        assert_eq!(session.batch_limit, 1);
    }

    #[tokio::test]
    async fn test_fill_batch_defaults_to_checkpoint() {
        let store = CacheStore::in_memory().await.unwrap();
        store.record_offset(17).await.unwrap();

        let mut session = BatchSession::new(Arc::new(EmptyCatalog), 10);
        let count = session.fill_batch(&store, None).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(session.origin(), Some(&BatchOrigin::Search { offset: 17 }));
        assert_eq!(session.pending()[0].catalog_id.as_deref(), Some("id0"));
    }

    #[tokio::test]
    async fn test_playlist_api_error_is_upstream() {
        let mut session = BatchSession::new(Arc::new(EmptyCatalog), 10);
        let err = session.fill_batch_from_playlist("37i9dQZF1DXcBWIGoYBM5M").await.unwrap_err();
        assert!(matches!(err, ResolveError::UpstreamApi(ref m) if m == "Invalid playlist Id"));
    }

    #[tokio::test]
    async fn test_bad_playlist_ref_rejected_before_fetch() {
        let mut session = BatchSession::new(Arc::new(EmptyCatalog), 10);
        let err = session.fill_batch_from_playlist("not a playlist!").await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Common(genderify_common::Error::InvalidInput(_))
        ));
    }
}
