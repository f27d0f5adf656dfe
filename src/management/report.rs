use std::{
    fmt,
    io::Error,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::taste::{HistoryRequest, ScoredCandidate, ScoringPolicy, TasteProfile};

#[derive(Debug)]
pub enum ReportError {
    IoError(Error),
    SerdeError(serde_json::Error),
}

impl From<Error> for ReportError {
    fn from(err: Error) -> Self {
        ReportError::IoError(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::SerdeError(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::IoError(e) => write!(f, "I/O error: {}", e),
            ReportError::SerdeError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}

/// One ranked band as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub rank: usize,
    pub name: String,
    pub matched_artist: Option<String>,
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    pub score: f64,
    pub genre_score: f64,
    pub popularity_score: f64,
    pub lookup_error: Option<String>,
}

impl CandidateRecord {
    pub fn from_scored(rank: usize, scored: &ScoredCandidate) -> Self {
        let candidate = &scored.candidate;
        Self {
            rank,
            name: candidate.name.clone(),
            matched_artist: candidate.matched_name().map(str::to_string),
            genres: candidate.genres().to_vec(),
            popularity: candidate.popularity(),
            score: scored.score.total,
            genre_score: scored.score.genre,
            popularity_score: scored.score.popularity,
            lookup_error: candidate.lookup_error().map(str::to_string),
        }
    }
}

/// Full result of a run: profile, scoring policy and all ranked candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: String,
    pub source: HistoryRequest,
    pub policy: ScoringPolicy,
    pub profile: TasteProfile,
    pub candidates: Vec<CandidateRecord>,
}

impl Report {
    /// `ranked` must already be in ranking order; ranks start at 1.
    pub fn new(
        source: HistoryRequest,
        policy: ScoringPolicy,
        profile: &TasteProfile,
        ranked: &[ScoredCandidate],
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            source,
            policy,
            profile: profile.clone(),
            candidates: ranked
                .iter()
                .enumerate()
                .map(|(i, scored)| CandidateRecord::from_scored(i + 1, scored))
                .collect(),
        }
    }

    /// Ordered `(name, score)` pairs, as shown on the console.
    pub fn ranking(&self) -> Vec<(String, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.name.clone(), c.score))
            .collect()
    }
}

/// Reads and writes a [`Report`] at a fixed path.
pub struct ReportManager {
    path: PathBuf,
}

impl ReportManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the report atomically.
    ///
    /// The JSON goes to a temporary sibling file first which is then renamed
    /// over the target, so the target is either the old or the complete new
    /// report.
    pub async fn persist(&self, report: &Report) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(report)?;
        let tmp_path = self.tmp_path();
        async_fs::write(&tmp_path, json).await?;

        if let Err(e) = async_fs::rename(&tmp_path, &self.path).await {
            let _ = async_fs::remove_file(&tmp_path).await;
            return Err(ReportError::IoError(e));
        }
        Ok(())
    }

    pub async fn load(&self) -> Result<Report, ReportError> {
        let json = async_fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.json".to_string());
        self.path.with_file_name(format!(".{}.tmp", file_name))
    }
}
