//! Source Page Locator
//!
//! Finds a validated musician / group page for an artist on one source,
//! following at most one disambiguation hop. The artist's URL for the source
//! reflects the page actually used, and is restored if the lookup fails.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{SourceKind, SourcePage};
use crate::error::{ResolveError, ResolveResult};
use crate::models::ArtistIdentity;
use crate::services::page_fetcher::PageFetcher;

pub struct SourceLocator {
    fetcher: Arc<dyn PageFetcher>,
}

impl SourceLocator {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Validated artist page on `kind`, or `None`
    ///
    /// Fetch and validation failures are logged and yield `None`; the
    /// identity's URL for `kind` is rolled back in that case.
    pub async fn locate(
        &self,
        kind: SourceKind,
        identity: &mut ArtistIdentity,
        depth: usize,
    ) -> Option<SourcePage> {
        let previous_url = identity.url_for(kind).cloned();

        match self.try_locate(kind, identity, depth).await {
            Ok(Some(page)) => {
                identity.set_url(kind, Some(page.url.clone()));
                Some(page)
            }
            Ok(None) => {
                info!(artist = %identity.name, depth, "Not found on {}", kind);
                identity.set_url(kind, previous_url);
                None
            }
            Err(e) => {
                warn!(artist = %identity.name, depth, "{}", e);
                identity.set_url(kind, previous_url);
                None
            }
        }
    }

    async fn try_locate(
        &self,
        kind: SourceKind,
        identity: &mut ArtistIdentity,
        depth: usize,
    ) -> ResolveResult<Option<SourcePage>> {
        let url = identity
            .url_for(kind)
            .cloned()
            .unwrap_or_else(|| kind.derive_url(&identity.name));
        identity.set_url(kind, Some(url.clone()));
        info!(artist = %identity.name, depth, "Trying {} URL {}...", kind, url);

        let Some(mut page) = self.fetch_page(kind, &url).await? else {
            return Ok(None);
        };

        // Some redirects are legitimate aliases; all are rejected
        if page.redirected_from(&identity.name) {
            return Err(mismatch(kind, &url, "page redirects"));
        }

        if page.is_disambiguation(&identity.name) {
            page = self.follow_disambiguation(kind, &page).await?;
        } else if !page.is_artist_page() {
            if let Some(link) = page.see_also_disambiguation(&identity.name) {
                let href = link.href.clone();
                debug!(artist = %identity.name, "Following disambiguation pointer {}", href);
                let Some(pointer_page) = self.fetch_page(kind, &href).await? else {
                    return Ok(None);
                };
                if !pointer_page.is_disambiguation(&identity.name) {
                    return Err(mismatch(kind, &href, "pointer is not a disambiguation page"));
                }
                page = self.follow_disambiguation(kind, &pointer_page).await?;
            }
        }

        if !page.is_artist_page() {
            return Err(mismatch(kind, &page.url, "probably isn't a musician page"));
        }

        Ok(Some(page))
    }

    /// The single unambiguous musical candidate on a disambiguation page
    async fn follow_disambiguation(
        &self,
        kind: SourceKind,
        page: &SourcePage,
    ) -> ResolveResult<SourcePage> {
        let candidates = page.disambiguation_candidates();
        if candidates.len() != 1 {
            return Err(mismatch(
                kind,
                &page.url,
                &format!(
                    "disambiguation page with {} musical candidates",
                    candidates.len()
                ),
            ));
        }

        let href = candidates[0].href.clone();
        info!("Disambiguated to {}", href);
        self.fetch_page(kind, &href)
            .await?
            .ok_or_else(|| mismatch(kind, &href, "disambiguated page not found"))
    }

    /// Fetch and parse; `None` for a clean not-found
    async fn fetch_page(&self, kind: SourceKind, url: &str) -> ResolveResult<Option<SourcePage>> {
        let fetched = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| ResolveError::FetchFailure {
                source_kind: kind,
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !fetched.is_success() && kind.treats_error_status_as_not_found() {
            debug!(url = %url, status = fetched.status, "Treating status as not found");
            return Ok(None);
        }

        Ok(Some(kind.parse(url, &fetched.body)))
    }
}

fn mismatch(kind: SourceKind, url: &str, reason: &str) -> ResolveError {
    ResolveError::ParseMismatch {
        source_kind: kind,
        url: url.to_string(),
        reason: reason.to_string(),
    }
}
