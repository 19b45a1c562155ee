//! Error types for genderify
//!
//! Only `UpstreamApi` and `Cancelled` end a batch. Fetch and parse failures
//! mean "this source yielded nothing"; persistence failures cost the durable
//! record of one artist.

use thiserror::Error;

use crate::services::spotify_client::CatalogError;
use crate::sources::SourceKind;

/// Resolution error taxonomy
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Network / HTTP level failure talking to a source
    #[error("{source_kind} fetch failed for {url}: {message}")]
    FetchFailure {
        source_kind: SourceKind,
        url: String,
        message: String,
    },

    /// Page fetched but failed structural validation
    #[error("{source_kind} page {url} rejected: {reason}")]
    ParseMismatch {
        source_kind: SourceKind,
        url: String,
        reason: String,
    },

    /// Store write / delete error for one artist
    #[error("Persistence failure for {artist}: {source}")]
    Persistence {
        artist: String,
        #[source]
        source: genderify_common::Error,
    },

    /// Catalog API returned an error payload
    #[error("Catalog API error: {0}")]
    UpstreamApi(String),

    /// Explicit interrupt
    #[error("Cancelled by user")]
    Cancelled,

    /// genderify-common error
    #[error(transparent)]
    Common(#[from] genderify_common::Error),
}

impl From<CatalogError> for ResolveError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ApiError(message) => ResolveError::UpstreamApi(message),
            CatalogError::InvalidPlaylistRef(reference) => ResolveError::Common(
                genderify_common::Error::InvalidInput(format!("playlist reference {}", reference)),
            ),
            other => ResolveError::UpstreamApi(other.to_string()),
        }
    }
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
