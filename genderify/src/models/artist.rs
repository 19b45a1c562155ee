//! Artist identity and gender labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sources::SourceKind;

/// Gender label derived from a biography's first pronoun
///
/// "Unknown" is modelled as `Option::None` wherever a label may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderLabel {
    Nonbinary,
    Female,
    Male,
}

impl GenderLabel {
    /// Stored / displayed form
    pub fn as_str(self) -> &'static str {
        match self {
            GenderLabel::Nonbinary => "nonbinary",
            GenderLabel::Female => "female",
            GenderLabel::Male => "male",
        }
    }
}

impl fmt::Display for GenderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenderLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nonbinary" | "non-binary" => Ok(GenderLabel::Nonbinary),
            "female" => Ok(GenderLabel::Female),
            "male" => Ok(GenderLabel::Male),
            other => Err(format!("unknown gender label: {}", other)),
        }
    }
}

/// An artist as known to the engine
///
/// `name` is the identity (and cache key, compared case-sensitively). Source
/// URLs are filled in as resolution discovers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistIdentity {
    pub name: String,
    /// Opaque catalog (Spotify) id
    pub catalog_id: Option<String>,
    /// Encyclopedia (Wikipedia) page URL
    pub primary_url: Option<String>,
    /// Fan-wiki (Last.fm) page URL
    pub secondary_url: Option<String>,
}

impl ArtistIdentity {
    /// Identity with just a name set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog_id: None,
            primary_url: None,
            secondary_url: None,
        }
    }

    pub fn with_catalog_id(mut self, catalog_id: Option<String>) -> Self {
        self.catalog_id = catalog_id;
        self
    }

    /// URL already known for the given source, if any
    pub fn url_for(&self, kind: SourceKind) -> Option<&String> {
        match kind {
            SourceKind::Wikipedia => self.primary_url.as_ref(),
            SourceKind::LastFm => self.secondary_url.as_ref(),
        }
    }

    pub fn set_url(&mut self, kind: SourceKind, url: Option<String>) {
        match kind {
            SourceKind::Wikipedia => self.primary_url = url,
            SourceKind::LastFm => self.secondary_url = url,
        }
    }

    /// Source URLs known for this artist, in source priority order
    pub fn known_urls(&self) -> impl Iterator<Item = &String> {
        self.primary_url.iter().chain(self.secondary_url.iter())
    }
}
