//! Spotify catalog client
//!
//! Paged artist search and playlist track listing, authenticated with an
//! operator-supplied bearer token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Track pages read per playlist (100 tracks each)
pub const MAX_PLAYLIST_PAGES: usize = 100;

/// Largest page the search endpoint returns
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Query matching every artist with a release year
const SEARCH_ALL_QUERY: &str = "year:0000-9999";

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Error payload returned by the API
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid playlist reference: {0}")]
    InvalidPlaylistRef(String),
}

/// Artist as returned by search and track listings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CatalogArtist {
    /// Absent for local files in playlists
    pub id: Option<String>,
    pub name: String,
}

/// One page of artist search results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistPage {
    pub items: Vec<CatalogArtist>,
    pub limit: u32,
    pub offset: u32,
}

/// A playlist with its tracks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Playlist {
    pub name: String,
    pub description: Option<String>,
    pub tracks: PlaylistTracks,
}

/// One page of a playlist's track list
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistTracks {
    pub items: Vec<PlaylistItem>,
    /// URL of the following page, absent on the last one
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistItem {
    /// Null for tracks removed from the catalog
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistTrack {
    pub artists: Vec<CatalogArtist>,
}

impl Playlist {
    /// Append a following page of tracks
    pub fn append_page(&mut self, page: PlaylistTracks) {
        self.tracks.items.extend(page.items);
        self.tracks.next = page.next;
    }

    /// Track artists in listing order (duplicates kept)
    pub fn artists(&self) -> impl Iterator<Item = &CatalogArtist> {
        self.tracks
            .items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .flat_map(|track| track.artists.iter())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: ArtistPage,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Source of artist identities to resolve
#[async_trait]
pub trait ArtistCatalog: Send + Sync {
    /// One page of artist search results
    async fn search_artists(&self, offset: u32, limit: u32) -> Result<ArtistPage, CatalogError>;

    /// Playlist by id
    async fn playlist(&self, playlist_id: &str) -> Result<Playlist, CatalogError>;
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    token: String,
}

impl SpotifyClient {
    pub fn new(token: impl Into<String>) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            token: token.into(),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<String, CatalogError> {
        tracing::debug!(url = %url, "Querying Spotify API");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))
    }
}

#[async_trait]
impl ArtistCatalog for SpotifyClient {
    async fn search_artists(&self, offset: u32, limit: u32) -> Result<ArtistPage, CatalogError> {
        let query = [
            ("q", SEARCH_ALL_QUERY.to_string()),
            ("type", "artist".to_string()),
            ("limit", limit.min(MAX_PAGE_LIMIT).to_string()),
            ("offset", offset.to_string()),
        ];
        let body = self
            .get_json(&format!("{}/search", SPOTIFY_API_BASE), &query)
            .await?;

        let page = parse_search_response(&body)?;
        tracing::info!(offset = page.offset, count = page.items.len(), "Fetched artist page");
        Ok(page)
    }

    async fn playlist(&self, playlist_id: &str) -> Result<Playlist, CatalogError> {
        let body = self
            .get_json(&format!("{}/playlists/{}", SPOTIFY_API_BASE, playlist_id), &[])
            .await?;
        let mut playlist = parse_playlist_response(&body)?;

        follow_track_pages(&mut playlist, move |url: String| async move {
            self.get_json(&url, &[]).await
        })
        .await?;
        Ok(playlist)
    }
}

/// Fetch the playlist's remaining track pages through their `next` links
///
/// Stops after [`MAX_PLAYLIST_PAGES`] pages, logging the truncation.
pub async fn follow_track_pages<F, Fut>(playlist: &mut Playlist, mut fetch: F) -> Result<(), CatalogError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, CatalogError>>,
{
    let mut pages = 1;
    while let Some(next) = playlist.tracks.next.take() {
        if pages >= MAX_PLAYLIST_PAGES {
            tracing::warn!(
                playlist = %playlist.name,
                tracks = playlist.tracks.items.len(),
                "Playlist truncated after {} pages",
                pages
            );
            break;
        }
        let body = fetch(next).await?;
        playlist.append_page(parse_tracks_page(&body)?);
        pages += 1;
    }
    Ok(())
}

/// Decode a search response, surfacing an API error payload's message
pub fn parse_search_response(body: &str) -> Result<ArtistPage, CatalogError> {
    match serde_json::from_str::<SearchResponse>(body) {
        Ok(response) => Ok(response.artists),
        Err(e) => Err(api_error_or(body, e)),
    }
}

/// Decode a playlist response, surfacing an API error payload's message
pub fn parse_playlist_response(body: &str) -> Result<Playlist, CatalogError> {
    serde_json::from_str::<Playlist>(body).map_err(|e| api_error_or(body, e))
}

/// Decode a follow-up page of playlist tracks
pub fn parse_tracks_page(body: &str) -> Result<PlaylistTracks, CatalogError> {
    serde_json::from_str::<PlaylistTracks>(body).map_err(|e| api_error_or(body, e))
}

fn api_error_or(body: &str, parse_error: serde_json::Error) -> CatalogError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => CatalogError::ApiError(response.error.message),
        Err(_) => CatalogError::ParseError(format!(
            "Response was weird ({}): {}",
            parse_error,
            body.chars().take(200).collect::<String>()
        )),
    }
}

/// Playlist id from a bare id, `spotify:playlist:<id>` URI or open.spotify.com URL
pub fn parse_playlist_ref(reference: &str) -> Result<String, CatalogError> {
    let reference = reference.trim();
    let id = if let Some(id) = reference.strip_prefix("spotify:playlist:") {
        id
    } else if let Some(pos) = reference.find("/playlist/") {
        let rest = &reference[pos + "/playlist/".len()..];
        rest.split(['?', '/', '#']).next().unwrap_or_default()
    } else {
        reference
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CatalogError::InvalidPlaylistRef(reference.to_string()));
    }
    Ok(id.to_string())
}
