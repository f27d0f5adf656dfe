use std::path::{Path, PathBuf};

use rand::{Rng, distr::Alphanumeric};

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Band names of an input file: one per line, trimmed, blank lines dropped.
pub fn parse_band_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn read_band_list(path: &Path) -> Result<Vec<String>, String> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    Ok(parse_band_list(&content))
}

/// `<dir>/<stem>_recommendations.json` next to the bands file.
pub fn default_output_path(bands_file: &Path) -> PathBuf {
    let stem = bands_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bands".to_string());
    bands_file.with_file_name(format!("{}_recommendations.json", stem))
}

/// Comma separated list of the first `max` genres, `-` if there are none.
pub fn format_genres(genres: &[String], max: usize) -> String {
    if genres.is_empty() {
        return "-".to_string();
    }
    genres
        .iter()
        .take(max)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_popularity(popularity: Option<u32>) -> String {
    match popularity {
        Some(p) => format!("{}/100", p),
        None => "n/a".to_string(),
    }
}
