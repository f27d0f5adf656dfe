use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Raw answer of the Spotify token endpoint.
///
/// `refresh_token` is missing on refresh responses that keep the previous
/// refresh token valid.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
}

/// State shared between the authorization flow and the callback endpoint.
#[derive(Debug, Clone)]
pub struct PendingAuth {
    /// Random value sent with the authorization request and echoed back.
    pub state: String,
    /// Authorization code received by the callback.
    pub code: Option<String>,
    /// Error reported by the authorization server.
    pub error: Option<String>,
}

pub type SharedAuth = Arc<Mutex<Option<PendingAuth>>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistSearchResponse {
    pub artists: Page<Artist>,
}

/// Answer of `GET /artists?ids=...`; unknown ids come back as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveralArtistsResponse {
    pub artists: Vec<Option<Artist>>,
}

#[derive(Tabled)]
pub struct RecommendationTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub similarity: String,
    pub genres: String,
    pub popularity: String,
}

#[derive(Tabled)]
pub struct GenreTableRow {
    pub genre: String,
    pub count: u32,
}
