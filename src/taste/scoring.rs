use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use super::{
    catalog::Lookup,
    profile::{TasteProfile, normalize_genre},
};

pub const DEFAULT_GENRE_WEIGHT: f64 = 0.5;
pub const DEFAULT_POPULARITY_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoringPolicyError {
    InvalidWeight { name: &'static str, value: f64 },
    ZeroWeights,
}

impl fmt::Display for ScoringPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringPolicyError::InvalidWeight { name, value } => {
                write!(f, "{name} must be a finite, non-negative number (got {value})")
            }
            ScoringPolicyError::ZeroWeights => {
                write!(f, "genre and popularity weight cannot both be zero")
            }
        }
    }
}

impl std::error::Error for ScoringPolicyError {}

/// Similarity of one candidate to the taste profile.
///
/// Every component lies in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub total: f64,
    pub genre: f64,
    pub popularity: f64,
}

impl Score {
    /// Score of a candidate without catalog metadata.
    pub const MINIMUM: Score = Score {
        total: 0.0,
        genre: 0.0,
        popularity: 0.0,
    };
}

/// Coefficients of the similarity score.
///
/// The total is the weighted mean of the genre overlap and the popularity
/// proximity. With `frequency_weighted` each shared genre contributes its
/// count relative to the profile's most frequent genre, otherwise every
/// shared genre counts fully.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    genre_weight: f64,
    popularity_weight: f64,
    frequency_weighted: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            genre_weight: DEFAULT_GENRE_WEIGHT,
            popularity_weight: DEFAULT_POPULARITY_WEIGHT,
            frequency_weighted: true,
        }
    }
}

impl ScoringPolicy {
    pub fn new(
        genre_weight: f64,
        popularity_weight: f64,
        frequency_weighted: bool,
    ) -> Result<Self, ScoringPolicyError> {
        check_weight("genre weight", genre_weight)?;
        check_weight("popularity weight", popularity_weight)?;
        if genre_weight + popularity_weight <= 0.0 {
            return Err(ScoringPolicyError::ZeroWeights);
        }

        Ok(Self {
            genre_weight,
            popularity_weight,
            frequency_weighted,
        })
    }

    pub fn genre_weight(&self) -> f64 {
        self.genre_weight
    }

    pub fn popularity_weight(&self) -> f64 {
        self.popularity_weight
    }

    pub fn frequency_weighted(&self) -> bool {
        self.frequency_weighted
    }

    /// Scores a lookup result against `profile`.
    ///
    /// A [`Lookup::NotFound`] always yields [`Score::MINIMUM`].
    pub fn score(&self, lookup: &Lookup, profile: &TasteProfile) -> Score {
        match lookup {
            Lookup::NotFound { .. } => Score::MINIMUM,
            Lookup::Found(artist) => {
                let genre = self.genre_overlap(&artist.genres, profile);
                let popularity = popularity_proximity(artist.popularity, profile);
                let total = (self.genre_weight * genre + self.popularity_weight * popularity)
                    / (self.genre_weight + self.popularity_weight);

                Score {
                    total: sanitise(total),
                    genre,
                    popularity,
                }
            }
        }
    }

    /// Share of the candidate's distinct genres found in the profile.
    pub fn genre_overlap(&self, genres: &[String], profile: &TasteProfile) -> f64 {
        let genres: BTreeSet<String> = genres.iter().filter_map(|g| normalize_genre(g)).collect();
        if genres.is_empty() {
            return 0.0;
        }

        let matched: f64 = genres
            .iter()
            .map(|genre| {
                if self.frequency_weighted {
                    profile.relative_weight(genre)
                } else if profile.contains_genre(genre) {
                    1.0
                } else {
                    0.0
                }
            })
            .sum();

        sanitise(matched / genres.len() as f64)
    }
}

/// `1.0` for an exact match of the profile's average popularity, falling
/// linearly to `0.0` at a distance of 100.
pub fn popularity_proximity(popularity: u32, profile: &TasteProfile) -> f64 {
    let distance = (popularity.min(100) as f64 - profile.average_popularity()).abs();
    sanitise(1.0 - distance / 100.0)
}

fn check_weight(name: &'static str, value: f64) -> Result<(), ScoringPolicyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScoringPolicyError::InvalidWeight { name, value })
    }
}

fn sanitise(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}
