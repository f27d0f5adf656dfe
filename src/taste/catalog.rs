use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::Res;

use super::profile::ListeningItem;

/// Which of the user's top lists feeds the taste profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopSource {
    /// Top tracks; genres come from the tracks' artists.
    Tracks,
    /// Top artists.
    Artists,
}

impl TopSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopSource::Tracks => "tracks",
            TopSource::Artists => "artists",
        }
    }
}

/// Time frame of the user's top lists as understood by Spotify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks.
    ShortTerm,
    /// Roughly the last six months.
    MediumTerm,
    /// Several years of data.
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

/// Parameters for fetching the listening history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    #[serde(rename = "kind")]
    pub source: TopSource,
    pub time_range: TimeRange,
    pub limit: u32,
}

impl Default for HistoryRequest {
    fn default() -> Self {
        Self {
            source: TopSource::Tracks,
            time_range: TimeRange::ShortTerm,
            limit: 50,
        }
    }
}

/// Catalog metadata of the artist a band name resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistMatch {
    pub matched_name: String,
    pub genres: Vec<String>,
    pub popularity: u32,
}

/// Outcome of resolving a band name.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(ArtistMatch),
    NotFound { reason: String },
}

impl Lookup {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Lookup::NotFound {
            reason: reason.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Read access to a music catalog and the user's listening history.
///
/// [`crate::spotify::SpotifyClient`] is the production implementation; the
/// pipeline only depends on this trait so tests can plug in a fake catalog.
#[allow(async_fn_in_trait)]
pub trait MusicCatalog {
    /// Returns the user's top items, each with its genre tags and popularity.
    async fn listening_history(&self, request: &HistoryRequest) -> Res<Vec<ListeningItem>>;

    /// Resolves a free-text band name; `Ok(None)` means nothing matched.
    async fn find_artist(&self, name: &str) -> Res<Option<ArtistMatch>>;
}
