use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry of the user's listening history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListeningItem {
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

impl ListeningItem {
    pub fn new(genres: Vec<String>, popularity: Option<u32>) -> Self {
        Self { genres, popularity }
    }
}

/// Trims and lowercases a genre tag; blank tags yield `None`.
pub fn normalize_genre(genre: &str) -> Option<String> {
    let genre = genre.trim();
    if genre.is_empty() {
        None
    } else {
        Some(genre.to_lowercase())
    }
}

/// Aggregated genre frequencies and mean popularity of a listening history.
///
/// Built once per run through [`TasteProfile::build`] and only read
/// afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TasteProfile {
    item_count: usize,
    average_popularity: f64,
    genre_counts: BTreeMap<String, u32>,
}

impl TasteProfile {
    /// Counts every genre tag of every item and averages the popularity of
    /// the items that carry one.
    ///
    /// Without any popularity value the average is `0.0`.
    pub fn build(items: &[ListeningItem]) -> Self {
        let mut genre_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut popularity_sum = 0u64;
        let mut popularity_items = 0u64;

        for item in items {
            for genre in item.genres.iter().filter_map(|g| normalize_genre(g)) {
                *genre_counts.entry(genre).or_insert(0) += 1;
            }
            if let Some(popularity) = item.popularity {
                popularity_sum += popularity.min(100) as u64;
                popularity_items += 1;
            }
        }

        let average_popularity = if popularity_items == 0 {
            0.0
        } else {
            popularity_sum as f64 / popularity_items as f64
        };

        Self {
            item_count: items.len(),
            average_popularity,
            genre_counts,
        }
    }

    /// Assembles a profile from already aggregated values.
    ///
    /// Genre keys are normalized, zero counts dropped and the popularity
    /// clamped to `0..=100`.
    pub fn from_parts(
        genre_counts: impl IntoIterator<Item = (String, u32)>,
        average_popularity: f64,
        item_count: usize,
    ) -> Self {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for (genre, count) in genre_counts {
            if count == 0 {
                continue;
            }
            if let Some(genre) = normalize_genre(&genre) {
                *counts.entry(genre).or_insert(0) += count;
            }
        }
        let average_popularity = if average_popularity.is_finite() {
            average_popularity.clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            item_count,
            average_popularity,
            genre_counts: counts,
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn average_popularity(&self) -> f64 {
        self.average_popularity
    }

    pub fn genre_counts(&self) -> &BTreeMap<String, u32> {
        &self.genre_counts
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Number of genre tags seen while building the profile.
    pub fn total_tags(&self) -> u64 {
        self.genre_counts.values().map(|c| *c as u64).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.genre_counts.values().copied().max().unwrap_or(0)
    }

    pub fn count_of(&self, genre: &str) -> u32 {
        normalize_genre(genre)
            .and_then(|g| self.genre_counts.get(&g).copied())
            .unwrap_or(0)
    }

    pub fn contains_genre(&self, genre: &str) -> bool {
        self.count_of(genre) > 0
    }

    /// Frequency of `genre` relative to the most frequent genre, `0.0..=1.0`.
    pub fn relative_weight(&self, genre: &str) -> f64 {
        let max = self.max_count();
        if max == 0 {
            return 0.0;
        }
        self.count_of(genre) as f64 / max as f64
    }

    /// The `n` most frequent genres, ties ordered by name.
    pub fn top_genres(&self, n: usize) -> Vec<(&str, u32)> {
        let mut genres: Vec<(&str, u32)> = self
            .genre_counts
            .iter()
            .map(|(genre, count)| (genre.as_str(), *count))
            .collect();
        genres.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        genres.truncate(n);
        genres
    }
}

