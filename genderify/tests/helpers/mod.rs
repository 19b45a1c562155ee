//! Test Helper Utilities
//!
//! Canned-page fetcher, fake catalog and page builders shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use genderify::services::page_fetcher::{FetchError, FetchedPage, PageFetcher};
use genderify::services::spotify_client::{
    parse_playlist_response, ArtistCatalog, ArtistPage, CatalogArtist, CatalogError, Playlist,
};
use genderify::{CacheStore, Genderifier, GenderifierOptions};

pub fn wiki_url(title: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", title)
}

/// Secondary source wiki URL for a name (spaces become `+`)
pub fn lastfm_url(name: &str) -> String {
    format!("https://www.last.fm/music/{}/+wiki", name.replace(' ', "+"))
}

/// Encyclopedia article of a person with the given biography
pub fn wiki_person(bio: &str) -> String {
    format!(
        r#"<html><body>
        <table class="infobox">
          <tr><th scope="row" class="infobox-label">Genres</th><td>Pop</td></tr>
          <tr><th scope="row" class="infobox-label">Labels</th><td>Konichiwa</td></tr>
        </table>
        <p>{}</p>
        </body></html>"#,
        bio
    )
}

/// Encyclopedia article of a person without any prose
pub fn wiki_person_without_bio() -> String {
    r#"<html><body>
        <table class="infobox">
          <tr><th scope="row" class="infobox-label">Instruments</th><td>Vocals</td></tr>
        </table>
        </body></html>"#
        .to_string()
}

/// Encyclopedia article of a group listing `(name, href)` members
pub fn wiki_group(members: &[(&str, &str)]) -> String {
    let items: String = members
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{}" title="{}">{}</a></li>"#, href, name, name))
        .collect();
    format!(
        r#"<html><body>
        <table class="infobox">
          <tr><th scope="row" class="infobox-label">Genres</th><td>Rock</td></tr>
          <tr><th scope="row" class="infobox-label">Members</th><td><ul>{}</ul></td></tr>
        </table>
        <p>A band.</p>
        </body></html>"#,
        items
    )
}

/// Fan-wiki page of a person with the given biography
pub fn lastfm_person(bio: &str) -> String {
    format!(
        r#"<html><body>
        <ul class="factbox">
          <li class="factbox-item"><h4 class="factbox-heading">Born</h4><p>1 January 1970</p></li>
        </ul>
        <div class="wiki-content"><p>{}</p></div>
        </body></html>"#,
        bio
    )
}

/// Serves canned pages by URL; everything else is a 404
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<String>>,
    stall_on: Mutex<Option<(String, CancellationToken)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), (200, body.into()));
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), (status, body.into()));
        self
    }

    /// The first fetch of `url` cancels `token` and never completes
    pub fn stall_and_cancel(self, url: impl Into<String>, token: CancellationToken) -> Self {
        *self.stall_on.lock().unwrap() = Some((url.into(), token));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        let stall = {
            let mut stall_on = self.stall_on.lock().unwrap();
            match stall_on.as_ref() {
                Some((stall_url, _)) if stall_url == url => stall_on.take(),
                _ => None,
            }
        };
        if let Some((_, token)) = stall {
            token.cancel();
            std::future::pending::<()>().await;
        }

        let (status, body) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or((404, "<html><body><p>Page not found</p></body></html>".to_string()));
        Ok(FetchedPage { status, body })
    }
}

/// Catalog serving a fixed artist list and, optionally, one playlist
#[derive(Default)]
pub struct FakeCatalog {
    artists: Vec<String>,
    playlist_json: Option<String>,
    api_error: Option<String>,
    searches: Mutex<Vec<(u32, u32)>>,
}

impl FakeCatalog {
    pub fn with_artists(names: &[&str]) -> Self {
        Self {
            artists: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Playlist whose tracks carry the given artist names
    pub fn with_playlist(tracks: &[&[&str]]) -> Self {
        let items: Vec<serde_json::Value> = tracks
            .iter()
            .map(|artists| {
                let artists: Vec<serde_json::Value> = artists
                    .iter()
                    .map(|name| serde_json::json!({ "id": format!("id-{}", name), "name": name }))
                    .collect();
                serde_json::json!({ "track": { "artists": artists } })
            })
            .collect();
        let playlist = serde_json::json!({
            "name": "Test Mix",
            "description": "Songs for testing",
            "tracks": { "items": items }
        });
        Self {
            playlist_json: Some(playlist.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            api_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn searches(&self) -> Vec<(u32, u32)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtistCatalog for FakeCatalog {
    async fn search_artists(&self, offset: u32, limit: u32) -> Result<ArtistPage, CatalogError> {
        self.searches.lock().unwrap().push((offset, limit));
        if let Some(message) = &self.api_error {
            return Err(CatalogError::ApiError(message.clone()));
        }

        let items = self
            .artists
            .iter()
            .enumerate()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(ix, name)| CatalogArtist {
                id: Some(format!("artist-{}", ix)),
                name: name.clone(),
            })
            .collect();
        Ok(ArtistPage { items, limit, offset })
    }

    async fn playlist(&self, _playlist_id: &str) -> Result<Playlist, CatalogError> {
        if let Some(message) = &self.api_error {
            return Err(CatalogError::ApiError(message.clone()));
        }
        match &self.playlist_json {
            Some(json) => parse_playlist_response(json),
            None => Err(CatalogError::ApiError("Not found".to_string())),
        }
    }
}

/// Genderifier over a fresh in-memory store
pub async fn genderifier(fetcher: Arc<FakeFetcher>) -> Genderifier {
    genderifier_on(CacheStore::in_memory().await.unwrap(), fetcher, false)
}

pub fn genderifier_on(store: CacheStore, fetcher: Arc<FakeFetcher>, force_refresh: bool) -> Genderifier {
    Genderifier::new(store, fetcher, GenderifierOptions { force_refresh })
}
