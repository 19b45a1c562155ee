//! Resolution Coordinator ("Genderifier")
//!
//! Resolves one artist at a time:
//!
//! ```text
//! cache check ──hit──────────────────────────────────────────► report
//!      │ stale: delete (failure aborts)
//!      ▼ miss
//! push stack → for source in priority order:
//!                 locate page ─none─► next source
//!                 group?  → expand members (recursively) → store
//!                 person? → bio empty ─► next source
//!                           classify → store
//!              → all sources exhausted: unresolved (not stored)
//! pop stack → report
//! ```
//!
//! Group members are resolved through the same path, one level deep: a group
//! found while expanding a group is stored without expanding its members.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::db::CacheStore;
use crate::error::ResolveError;
use crate::models::{
    ArtistIdentity, GenderLabel, MemberDistribution, ResolutionResult, ResolutionStatus,
};
use crate::services::page_fetcher::PageFetcher;
use crate::services::pronoun_classifier;
use crate::services::session_report::SessionReport;
use crate::sources::{SourceKind, SourceLocator, SourcePage};

/// Deepest resolution stack at which a group's members are still expanded
pub const MAX_GROUP_DEPTH: usize = 1;

/// Behaviour switches for a session
#[derive(Debug, Clone, Default)]
pub struct GenderifierOptions {
    /// Treat every stored record as stale the first time it is met
    pub force_refresh: bool,
}

/// Names of the artists currently being resolved, outermost first
#[derive(Debug, Default)]
struct ResolutionStack {
    names: Vec<String>,
}

impl ResolutionStack {
    fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    fn pop(&mut self) {
        self.names.pop();
    }

    fn depth(&self) -> usize {
        self.names.len()
    }
}

enum CacheCheck {
    Hit(ResolutionResult),
    Stale,
    Miss,
}

pub struct Genderifier {
    store: CacheStore,
    locator: SourceLocator,
    options: GenderifierOptions,
    stack: ResolutionStack,
    report: SessionReport,
    /// Every non-aborted result of this session, by name
    session_results: HashMap<String, ResolutionResult>,
}

impl Genderifier {
    pub fn new(store: CacheStore, fetcher: Arc<dyn PageFetcher>, options: GenderifierOptions) -> Self {
        Self {
            store,
            locator: SourceLocator::new(fetcher),
            options,
            stack: ResolutionStack::default(),
            report: SessionReport::new(),
            session_results: HashMap::new(),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Number of artists currently being resolved
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Forget in-flight artists after a resolution future was dropped midway
    pub fn abandon_in_flight(&mut self) {
        if self.stack.depth() > 0 {
            warn!(abandoned = ?self.stack.names, "Abandoning in-flight resolution");
            self.stack.names.clear();
        }
    }

    /// Resolve an artist known only by name
    pub async fn genderise_name(&mut self, name: &str) -> ResolutionResult {
        self.genderise(ArtistIdentity::new(name)).await
    }

    /// Resolve one artist (and, for a top-level group, its members)
    pub async fn genderise(&mut self, identity: ArtistIdentity) -> ResolutionResult {
        let name = identity.name.clone();
        let depth = self.stack.depth();

        match self.check_cache(&name).await {
            CacheCheck::Hit(result) => return self.finish(result).await,
            CacheCheck::Stale => {
                if let Err(source) = self.store.delete(&name).await {
                    let err = ResolveError::Persistence {
                        artist: name.clone(),
                        source,
                    };
                    error!(artist = %name, depth, "Failed to delete stale record, skipping: {}", err);
                    return ResolutionResult::aborted(identity);
                }
            }
            CacheCheck::Miss => {}
        }

        info!(artist = %name, depth, "Trying to get gender(s) for {}...", name);

        self.stack.push(&name);
        let result = self.resolve_from_sources(identity).await;
        self.stack.pop();

        self.finish(result).await
    }

    async fn check_cache(&mut self, name: &str) -> CacheCheck {
        let depth = self.stack.depth();
        let stored = match self.store.lookup(name).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(artist = %name, depth, "Cache lookup failed, treating as miss: {}", e);
                None
            }
        };
        let seen_this_session = self.session_results.contains_key(name);

        match stored {
            Some(record) => {
                let refresh = self.options.force_refresh && !seen_this_session;
                if refresh {
                    info!(artist = %name, depth, "Found {} in database, refresh requested...", name);
                    CacheCheck::Stale
                } else if record.is_terminal() || seen_this_session {
                    info!(artist = %name, depth, "Found {} in database.", name);
                    CacheCheck::Hit(record)
                } else {
                    info!(artist = %name, depth, "Found {} in database, but unknown gender...", name);
                    CacheCheck::Stale
                }
            }
            None => match self.session_results.get(name) {
                Some(result) => {
                    debug!(artist = %name, depth, "Already resolved this session");
                    CacheCheck::Hit(result.clone())
                }
                None => CacheCheck::Miss,
            },
        }
    }

    /// Try each source in priority order until one yields a result
    async fn resolve_from_sources(&mut self, mut identity: ArtistIdentity) -> ResolutionResult {
        let depth = self.stack.depth();

        for kind in SourceKind::PRIORITY {
            let Some(page) = self.locator.locate(kind, &mut identity, depth).await else {
                continue;
            };

            if page.is_group() {
                let (lead, members) = self.expand_group(&page).await;
                let result = ResolutionResult::group(identity, lead, members);
                self.persist(&result).await;
                return result;
            }

            let bio = page.bio.trim();
            if bio.is_empty() {
                warn!(artist = %identity.name, depth, "No biography text on {}", kind);
                continue;
            }

            let result = ResolutionResult::person(identity, pronoun_classifier::classify(bio));
            self.persist(&result).await;
            return result;
        }

        ResolutionResult::unresolved(identity)
    }

    /// Resolve every member of a group page
    ///
    /// Returns the lead (first completed member's label) and the tally of
    /// completed members. Members that abort or stay unresolved are listed
    /// by name but not counted.
    async fn expand_group(&mut self, page: &SourcePage) -> (Option<GenderLabel>, MemberDistribution) {
        let depth = self.stack.depth();
        if depth > MAX_GROUP_DEPTH {
            warn!(depth, url = %page.url, "Bailing - too many groups deep.");
            return (None, MemberDistribution::default());
        }

        let members = page.members.clone().unwrap_or_default();
        info!(depth, url = %page.url, "Group with {} listed members", members.len());

        let mut lead: Option<Option<GenderLabel>> = None;
        let mut distribution = MemberDistribution::default();
        for member in members {
            distribution.member_names.push(member.name.clone());

            let result = Box::pin(self.genderise(member)).await;
            if !result.status.is_complete() {
                debug!(artist = %result.identity.name, depth, "Member not counted");
                continue;
            }
            if lead.is_none() {
                lead = Some(result.gender);
            }
            distribution.tally(result.gender);
        }

        (lead.flatten(), distribution)
    }

    /// Write a result; failures are logged and the session continues
    async fn persist(&self, result: &ResolutionResult) {
        if let Err(source) = self.store.insert(result).await {
            let err = ResolveError::Persistence {
                artist: result.identity.name.clone(),
                source,
            };
            error!(
                artist = %result.identity.name,
                depth = self.stack.depth(),
                "Result not durably recorded: {}",
                err
            );
        }
    }

    /// Log, report and remember a finished resolution
    async fn finish(&mut self, result: ResolutionResult) -> ResolutionResult {
        let depth = self.stack.depth();
        let name = &result.identity.name;

        match result.status {
            ResolutionStatus::Unresolved => {
                warn!(artist = %name, depth, "Couldn't find gender for {}", name);
            }
            _ => info!(artist = %name, depth, "{}", result.describe()),
        }
        for url in result.identity.known_urls() {
            info!(artist = %name, depth, "{}", url);
        }

        let first_seen = self.report.record(&result);
        if first_seen && result.is_group && result.status == ResolutionStatus::Cached {
            self.record_cached_members(&result).await;
        }
        if result.status != ResolutionStatus::Aborted {
            self.session_results.insert(name.clone(), result.clone());
        }
        result
    }

    /// Report the stored members of a group served from the cache
    ///
    /// Members without a stored record (they never resolved) are skipped.
    async fn record_cached_members(&mut self, group: &ResolutionResult) {
        let Some(members) = &group.members else {
            return;
        };
        for member in &members.member_names {
            if self.report.has_counted(member) {
                continue;
            }
            match self.store.lookup(member).await {
                Ok(Some(stored)) => {
                    self.report.record(&stored);
                }
                Ok(None) => debug!(artist = %member, "No stored record for group member"),
                Err(e) => warn!(artist = %member, "Cache lookup failed for group member: {}", e),
            }
        }
    }
}
