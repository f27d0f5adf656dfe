use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::sleep;

use crate::{Res, warning};

use super::{
    catalog::{HistoryRequest, Lookup, MusicCatalog},
    profile::TasteProfile,
    ranking::{Candidate, ScoredCandidate, rank},
    scoring::ScoringPolicy,
};

/// Fetches the listening history and condenses it into a profile.
///
/// Any catalog error is returned as is: without history there is nothing to
/// score against.
pub async fn build_profile<C: MusicCatalog>(
    catalog: &C,
    request: &HistoryRequest,
) -> Res<TasteProfile> {
    let items = catalog.listening_history(request).await?;
    Ok(TasteProfile::build(&items))
}

/// Resolves one band name, turning every failure into [`Lookup::NotFound`].
pub async fn resolve_candidate<C: MusicCatalog>(catalog: &C, name: &str) -> Candidate {
    let lookup = match catalog.find_artist(name).await {
        Ok(Some(artist)) => Lookup::Found(artist),
        Ok(None) => Lookup::not_found("no matching artist"),
        Err(e) => Lookup::not_found(format!("lookup failed: {}", e)),
    };
    Candidate::new(name, lookup)
}

/// Looks up and scores every band in input order, then ranks them.
///
/// Lookups run one after another with `delay` in between. Failed lookups are
/// reported as warnings and kept with the minimum score.
pub async fn score_candidates<C: MusicCatalog>(
    catalog: &C,
    names: &[String],
    profile: &TasteProfile,
    policy: &ScoringPolicy,
    delay: Duration,
) -> Vec<ScoredCandidate> {
    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let mut scored = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            sleep(delay).await;
        }
        pb.set_message(name.clone());

        let candidate = resolve_candidate(catalog, name).await;
        match &candidate.lookup {
            Lookup::NotFound { reason } => {
                pb.suspend(|| warning!("Skipping score for '{}': {}", name, reason));
            }
            Lookup::Found(artist) if !artist.matched_name.eq_ignore_ascii_case(name.trim()) => {
                pb.suspend(|| {
                    warning!(
                        "No exact match for '{}', using '{}'",
                        name,
                        artist.matched_name
                    )
                });
            }
            Lookup::Found(_) => {}
        }

        scored.push(ScoredCandidate::new(candidate, policy, profile));
        pb.inc(1);
    }
    pb.finish_and_clear();

    rank(scored)
}
