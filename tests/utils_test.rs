use std::path::{Path, PathBuf};

use bandrec::utils::*;

#[test]
fn test_generate_state() {
    let state = generate_state();

    assert_eq!(state.len(), 32);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated values should differ
    assert_ne!(state, generate_state());
}

#[test]
fn test_parse_band_list() {
    let content = "Radiohead\n\n  Sigur Rós  \r\n\t\nBoards of Canada\n   \n";

    let bands = parse_band_list(content);

    assert_eq!(bands, vec!["Radiohead", "Sigur Rós", "Boards of Canada"]);
}

#[test]
fn test_parse_band_list_keeps_duplicates_in_order() {
    let bands = parse_band_list("Low\nLow\nSlint");

    assert_eq!(bands, vec!["Low", "Low", "Slint"]);
}

#[test]
fn test_parse_band_list_empty() {
    assert!(parse_band_list("").is_empty());
    assert!(parse_band_list("\n \n\t").is_empty());
}

#[tokio::test]
async fn test_read_band_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bands.txt");
    std::fs::write(&path, "Low\n\nSlint\n").unwrap();

    let bands = read_band_list(&path).await.unwrap();

    assert_eq!(bands, vec!["Low", "Slint"]);
}

#[tokio::test]
async fn test_read_band_list_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.txt");

    let err = read_band_list(&path).await.unwrap_err();

    assert!(err.contains("missing.txt"));
}

#[test]
fn test_default_output_path() {
    assert_eq!(
        default_output_path(Path::new("/tmp/lists/bands.txt")),
        PathBuf::from("/tmp/lists/bands_recommendations.json")
    );
    assert_eq!(
        default_output_path(Path::new("festival")),
        PathBuf::from("festival_recommendations.json")
    );
}

#[test]
fn test_format_genres() {
    let genres: Vec<String> = ["shoegaze", "dream pop", "noise pop", "indie"]
        .iter()
        .map(|g| g.to_string())
        .collect();

    assert_eq!(format_genres(&genres, 3), "shoegaze, dream pop, noise pop");
    assert_eq!(format_genres(&genres[..1], 3), "shoegaze");
    assert_eq!(format_genres(&[], 3), "-");
}

#[test]
fn test_format_popularity() {
    assert_eq!(format_popularity(Some(42)), "42/100");
    assert_eq!(format_popularity(None), "n/a");
}
