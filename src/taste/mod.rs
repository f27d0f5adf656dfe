//! # Taste Module
//!
//! The recommendation core: everything between "we have the user's listening
//! history" and "here is the ranked list of bands". Nothing in here talks to
//! the network directly; all catalog access goes through the
//! [`MusicCatalog`] trait.
//!
//! ## Pipeline
//!
//! ```text
//! MusicCatalog::listening_history
//!          ↓
//! TasteProfile::build        genre counts + average popularity
//!          ↓
//! MusicCatalog::find_artist  once per band name, in input order
//!          ↓
//! ScoringPolicy::score       genre overlap + popularity proximity
//!          ↓
//! rank                       stable, descending by score
//! ```
//!
//! ## Scoring
//!
//! - **Genre overlap**: mean over the candidate's distinct genres of the
//!   genre's count relative to the profile's most frequent genre (or plain
//!   presence when frequency weighting is off).
//! - **Popularity proximity**: `1 - |popularity - average| / 100`.
//! - **Total**: weighted mean of both, `0.5`/`0.5` by default.
//!
//! Bands the catalog cannot resolve are kept with [`Score::MINIMUM`] and end
//! up at the bottom of the ranking.

mod catalog;
mod pipeline;
mod profile;
mod ranking;
mod scoring;

pub use catalog::{ArtistMatch, HistoryRequest, Lookup, MusicCatalog, TimeRange, TopSource};
pub use pipeline::{build_profile, resolve_candidate, score_candidates};
pub use profile::{ListeningItem, TasteProfile, normalize_genre};
pub use ranking::{Candidate, ScoredCandidate, rank};
pub use scoring::{
    DEFAULT_GENRE_WEIGHT, DEFAULT_POPULARITY_WEIGHT, Score, ScoringPolicy, ScoringPolicyError,
    popularity_proximity,
};
