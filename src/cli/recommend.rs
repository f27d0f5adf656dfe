use std::path::PathBuf;

use tabled::Table;

use crate::{
    config::Config,
    error, info,
    management::{Report, ReportManager},
    spotify::{self, SpotifyClient},
    success,
    taste::{self, HistoryRequest, ScoredCandidate, ScoringPolicy, TasteProfile},
    types::{GenreTableRow, RecommendationTableRow},
    utils, warning,
};

/// Genres listed in the profile summary.
const PROFILE_GENRES: usize = 10;
/// Genres listed per recommended band.
const BAND_GENRES: usize = 3;

/// Everything a scoring run needs from the command line.
#[derive(Debug, Clone)]
pub struct RecommendRequest {
    pub bands_file: PathBuf,
    pub output: Option<PathBuf>,
    pub top: usize,
    pub history: HistoryRequest,
    pub policy: ScoringPolicy,
}

pub async fn recommend(request: RecommendRequest) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let names = match utils::read_band_list(&request.bands_file).await {
        Ok(names) => names,
        Err(e) => error!("{}", e),
    };
    if names.is_empty() {
        error!(
            "No band names found in {}. Put one band per line.",
            request.bands_file.display()
        );
    }
    info!("Found {} candidate bands.", names.len());

    let access_token = match spotify::auth::access_token(&config).await {
        Ok(token) => token,
        Err(e) => error!("Authentication failed. Err: {}", e),
    };
    let client = match SpotifyClient::new(&config, access_token) {
        Ok(client) => client,
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    };

    info!("Pulling your top {}...", request.history.source.as_str());
    let profile = match taste::build_profile(&client, &request.history).await {
        Ok(profile) => profile,
        Err(e) => error!(
            "Failed to fetch your top {}. Err: {}",
            request.history.source.as_str(),
            e
        ),
    };
    if profile.is_empty() {
        warning!(
            "No top {} found, scores will lack a genre signal. Listen to some music on Spotify first.",
            request.history.source.as_str()
        );
    }
    print_profile(&profile);

    info!("Scoring bands...");
    let ranked = taste::score_candidates(
        &client,
        &names,
        &profile,
        &request.policy,
        config.lookup_delay,
    )
    .await;
    print_recommendations(&ranked, request.top);

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| utils::default_output_path(&request.bands_file));
    let report = Report::new(request.history, request.policy, &profile, &ranked);
    if let Err(e) = ReportManager::new(output.clone()).persist(&report).await {
        error!("Failed to save results to {}. Err: {}", output.display(), e);
    }

    success!("Full results saved to {}", output.display());
}

fn print_profile(profile: &TasteProfile) {
    info!(
        "Your taste profile: {} items, average popularity {:.1}/100",
        profile.item_count(),
        profile.average_popularity()
    );

    let rows: Vec<GenreTableRow> = profile
        .top_genres(PROFILE_GENRES)
        .into_iter()
        .map(|(genre, count)| GenreTableRow {
            genre: genre.to_string(),
            count,
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
}

fn print_recommendations(ranked: &[ScoredCandidate], top: usize) {
    info!("Top recommended bands:");

    let rows: Vec<RecommendationTableRow> = ranked
        .iter()
        .take(top)
        .enumerate()
        .map(|(i, scored)| RecommendationTableRow {
            rank: i + 1,
            name: scored.candidate.name.clone(),
            similarity: format!("{:.2}", scored.score.total),
            genres: utils::format_genres(scored.candidate.genres(), BAND_GENRES),
            popularity: utils::format_popularity(scored.candidate.popularity()),
        })
        .collect();

    println!("{}", Table::new(rows));

    let unresolved = ranked.iter().filter(|s| !s.candidate.lookup.is_found()).count();
    if unresolved > 0 {
        warning!(
            "{} of {} bands could not be found and were ranked last.",
            unresolved,
            ranked.len()
        );
    }
}
