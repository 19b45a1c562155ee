//! Service modules for artist gender resolution

pub mod batch_session;
pub mod genderifier;
pub mod page_fetcher;
pub mod pronoun_classifier;
pub mod session_report;
pub mod spotify_client;

pub use batch_session::{BatchOrigin, BatchSession, BatchSummary};
pub use genderifier::{Genderifier, GenderifierOptions, MAX_GROUP_DEPTH};
pub use page_fetcher::{FetchError, FetchedPage, HttpPageFetcher, PageFetcher};
pub use pronoun_classifier::{classify, Classification};
pub use session_report::SessionReport;
pub use spotify_client::{ArtistCatalog, ArtistPage, CatalogArtist, CatalogError, Playlist, SpotifyClient};
