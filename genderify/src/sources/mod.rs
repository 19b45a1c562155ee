//! Biography sources
//!
//! A closed set of sources, each with the same capabilities: build a page
//! URL, parse a fetched page into a [`SourcePage`] (artist markers, group
//! members, biography prose, links), and decide what a non-success HTTP
//! status means.

pub mod lastfm;
pub mod locator;
pub mod wikipedia;

pub use locator::SourceLocator;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::models::ArtistIdentity;

/// Link-text keywords marking a musical subject on a disambiguation page
const MUSIC_KEYWORDS: &[&str] = &["band", "musician", "singer", "rapper", "duo", "group"];

/// Any of [`MUSIC_KEYWORDS`] as a whole word
static MUSIC_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", MUSIC_KEYWORDS.join("|"))).expect("valid regex")
});

/// Short bracketed citation marker: "[1]", "[a]", "[note 2]"
static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\p{Alphabetic}\p{N} ]{1,16}\]").expect("valid regex"));

/// Field name that marks a group page
pub const MEMBERS_FIELD: &str = "Members";

/// Biography source, in [`SourceKind::PRIORITY`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Primary: encyclopedia (infobox + body paragraphs)
    Wikipedia,
    /// Secondary: fan wiki (factbox + wiki-content paragraphs)
    LastFm,
}

impl SourceKind {
    /// Order in which sources are tried
    pub const PRIORITY: [SourceKind; 2] = [SourceKind::Wikipedia, SourceKind::LastFm];

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Wikipedia => "Wikipedia",
            SourceKind::LastFm => "Last.fm",
        }
    }

    /// Page URL derived from an artist name
    ///
    /// Words are percent-encoded, then joined with `_` (Wikipedia) or `+`
    /// (Last.fm), so a literal `+`, `#` or `?` in a name stays in the path.
    pub fn derive_url(self, name: &str) -> String {
        match self {
            SourceKind::Wikipedia => format!(
                "{}/wiki/{}",
                wikipedia::BASE_URL,
                encode_words(&title_case(name), "_")
            ),
            SourceKind::LastFm => format!(
                "{}/music/{}/+wiki",
                lastfm::BASE_URL,
                encode_words(name, "+")
            ),
        }
    }

    /// Resolve an in-page href against this source's site
    pub fn absolute_url(self, href: &str) -> String {
        let base = match self {
            SourceKind::Wikipedia => wikipedia::BASE_URL,
            SourceKind::LastFm => lastfm::BASE_URL,
        };
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if let Some(rest) = href.strip_prefix("//") {
            format!("https://{}", rest)
        } else if href.starts_with('/') {
            format!("{}{}", base, href)
        } else {
            format!("{}/{}", base, href)
        }
    }

    /// Whether a non-success status is a clean "not found" (no parse attempted)
    pub fn treats_error_status_as_not_found(self) -> bool {
        matches!(self, SourceKind::LastFm)
    }

    /// Field names whose presence marks a musician / group page
    pub fn artist_markers(self) -> &'static [&'static str] {
        match self {
            SourceKind::Wikipedia => wikipedia::ARTIST_MARKERS,
            SourceKind::LastFm => lastfm::ARTIST_MARKERS,
        }
    }

    /// Parse a fetched page body
    pub fn parse(self, url: &str, body: &str) -> SourcePage {
        match self {
            SourceKind::Wikipedia => wikipedia::parse_page(url, body),
            SourceKind::LastFm => lastfm::parse_page(url, body),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A hyperlink found on a page, href already made absolute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub text: String,
    pub title: Option<String>,
    pub href: String,
}

/// Everything the engine needs from one fetched page
///
/// Built right after the fetch; the HTML tree is not kept.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub kind: SourceKind,
    pub url: String,
    /// All text on the page
    pub text: String,
    /// Infobox / factbox field names
    pub field_names: Vec<String>,
    /// Group members, when the page has a Members field
    pub members: Option<Vec<ArtistIdentity>>,
    /// Biography prose
    pub bio: String,
    /// Links that sit inside list items
    pub list_links: Vec<PageLink>,
    /// Every link on the page
    pub links: Vec<PageLink>,
}

impl SourcePage {
    /// Field names intersect the source's artist markers
    pub fn is_artist_page(&self) -> bool {
        let markers = self.kind.artist_markers();
        self.field_names.iter().any(|f| markers.contains(&f.as_str()))
    }

    pub fn is_group(&self) -> bool {
        self.members.is_some()
    }

    /// The page says it was reached through a redirect from `name`
    pub fn redirected_from(&self, name: &str) -> bool {
        self.text.contains(&format!("Redirected from {}", name))
    }

    /// "<name> may refer to:" / "<name> can refer to:"
    pub fn is_disambiguation(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        let text = self.text.to_lowercase();
        text.contains(&format!("{} may refer to:", name))
            || text.contains(&format!("{} can refer to:", name))
    }

    /// Distinct list links whose text or title names a musical subject
    pub fn disambiguation_candidates(&self) -> Vec<&PageLink> {
        let mut seen = HashSet::new();
        self.list_links
            .iter()
            .filter(|link| {
                MUSIC_KEYWORD.is_match(&link.text)
                    || MUSIC_KEYWORD.is_match(link.title.as_deref().unwrap_or_default())
            })
            .filter(|link| seen.insert(link.href.as_str()))
            .collect()
    }

    /// A "<name> (disambiguation)" pointer on a page that isn't the artist's
    pub fn see_also_disambiguation(&self, name: &str) -> Option<&PageLink> {
        let wanted = format!("{} (disambiguation)", name.to_lowercase());
        self.links
            .iter()
            .find(|link| link.text.trim().to_lowercase() == wanted)
    }
}

/// Capitalise the first character of every whitespace-separated word
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn encode_words(name: &str, separator: &str) -> String {
    name.split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Collapse whitespace and drop short bracketed citation markers ("[1]", "[a]")
pub(crate) fn clean_text(raw: &str) -> String {
    CITATION
        .replace_all(raw, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
