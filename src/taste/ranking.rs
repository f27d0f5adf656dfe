use super::{
    catalog::Lookup,
    profile::TasteProfile,
    scoring::{Score, ScoringPolicy},
};

/// A band name from the input file together with its lookup outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub lookup: Lookup,
}

impl Candidate {
    pub fn new(name: impl Into<String>, lookup: Lookup) -> Self {
        Self {
            name: name.into(),
            lookup,
        }
    }

    pub fn genres(&self) -> &[String] {
        match &self.lookup {
            Lookup::Found(artist) => &artist.genres,
            Lookup::NotFound { .. } => &[],
        }
    }

    pub fn popularity(&self) -> Option<u32> {
        match &self.lookup {
            Lookup::Found(artist) => Some(artist.popularity),
            Lookup::NotFound { .. } => None,
        }
    }

    pub fn matched_name(&self) -> Option<&str> {
        match &self.lookup {
            Lookup::Found(artist) => Some(&artist.matched_name),
            Lookup::NotFound { .. } => None,
        }
    }

    pub fn lookup_error(&self) -> Option<&str> {
        match &self.lookup {
            Lookup::Found(_) => None,
            Lookup::NotFound { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: Score,
}

impl ScoredCandidate {
    pub fn new(candidate: Candidate, policy: &ScoringPolicy, profile: &TasteProfile) -> Self {
        let score = policy.score(&candidate.lookup, profile);
        Self { candidate, score }
    }
}

/// Orders candidates by descending total score.
///
/// The sort is stable, so candidates with equal scores keep their input
/// order.
pub fn rank(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.total.total_cmp(&a.score.total));
    candidates
}
