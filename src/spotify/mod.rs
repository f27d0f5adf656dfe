//! # Spotify Integration Module
//!
//! Thin client for the parts of the Spotify Web API the recommender needs.
//! It is the production implementation of [`MusicCatalog`].
//!
//! ```text
//! taste pipeline
//!      ↓  MusicCatalog
//! SpotifyClient  ──  auth (authorization code flow, token refresh)
//!      ↓
//! reqwest (timeout per request)
//!      ↓
//! Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `GET /me/top/tracks` - the user's top tracks
//! - `GET /me/top/artists` - the user's top artists
//! - `GET /artists?ids=` - genres of the artists behind the top tracks
//! - `GET /search?type=artist` - resolving a band name
//! - `POST /api/token` - code exchange and refresh (see [`auth`])
//!
//! ## Transient Failures
//!
//! `502 Bad Gateway` and `429 Too Many Requests` are retried until the
//! configured attempt budget is spent, waiting for `Retry-After` when Spotify
//! sends one. Everything else surfaces as an error right away.

pub mod auth;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    Res,
    config::Config,
    taste::{ArtistMatch, HistoryRequest, ListeningItem, MusicCatalog, TopSource},
    types::{Artist, ArtistSearchResponse, Page, SeveralArtistsResponse, Track},
};

/// Maximum number of ids `GET /artists` accepts.
const ARTIST_BATCH_SIZE: usize = 50;
/// Search results considered when resolving a band name.
const SEARCH_LIMIT: u32 = 5;
/// Upper bound for a single wait between two attempts.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

/// Builds the HTTP client shared by all Spotify requests.
pub fn http_client(timeout: Duration) -> Res<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()?;
    Ok(client)
}

/// Authenticated, read-only session against the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    access_token: String,
    max_attempts: u32,
}

impl SpotifyClient {
    pub fn new(config: &Config, access_token: String) -> Res<Self> {
        Ok(Self {
            http: http_client(config.request_timeout)?,
            api_url: config.api_url.clone(),
            access_token,
            max_attempts: config.max_attempts,
        })
    }

    /// Creates a client for an arbitrary API base url.
    pub fn with_base_url(
        api_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
        max_attempts: u32,
    ) -> Res<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            max_attempts: max_attempts.max(1),
        })
    }

    pub async fn top_tracks(&self, request: &HistoryRequest) -> Res<Vec<Track>> {
        let page: Page<Track> = self
            .get_json(
                "/me/top/tracks",
                &[
                    ("limit", request.limit.to_string()),
                    ("time_range", request.time_range.as_str().to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    pub async fn top_artists(&self, request: &HistoryRequest) -> Res<Vec<Artist>> {
        let page: Page<Artist> = self
            .get_json(
                "/me/top/artists",
                &[
                    ("limit", request.limit.to_string()),
                    ("time_range", request.time_range.as_str().to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    /// Fetches full artist objects in batches; unknown ids are skipped.
    pub async fn artists_by_id(&self, ids: &[String]) -> Res<Vec<Artist>> {
        let mut artists = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ARTIST_BATCH_SIZE) {
            let res: SeveralArtistsResponse = self
                .get_json("/artists", &[("ids", chunk.join(","))])
                .await?;
            artists.extend(res.artists.into_iter().flatten());
        }
        Ok(artists)
    }

    pub async fn search_artists(&self, name: &str, limit: u32) -> Res<Vec<Artist>> {
        let res: ArtistSearchResponse = self
            .get_json(
                "/search",
                &[
                    ("q", name.to_string()),
                    ("type", "artist".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(res.artists.items)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Res<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .send_with_retry(|| self.http.get(&url).bearer_auth(&self.access_token).query(query))
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err("Spotify rejected the access token. Please run bandrec auth".into());
        }

        let response = response.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn send_with_retry<F>(&self, build: F) -> Res<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;

        loop {
            let response = build().send().await?;
            let status = response.status();
            let transient =
                status == StatusCode::BAD_GATEWAY || status == StatusCode::TOO_MANY_REQUESTS;

            if transient && attempt < self.max_attempts {
                let wait = retry_after(&response)
                    .unwrap_or_else(|| Duration::from_secs(attempt as u64))
                    .min(MAX_RETRY_WAIT);
                sleep(wait).await;
                attempt += 1;
                continue; // retry
            }

            return Ok(response);
        }
    }
}

impl MusicCatalog for SpotifyClient {
    async fn listening_history(&self, request: &HistoryRequest) -> Res<Vec<ListeningItem>> {
        match request.source {
            TopSource::Artists => {
                let artists = self.top_artists(request).await?;
                Ok(artists
                    .into_iter()
                    .map(|a| ListeningItem::new(a.genres, a.popularity))
                    .collect())
            }
            TopSource::Tracks => {
                let tracks = self.top_tracks(request).await?;
                let ids = track_artist_ids(&tracks);
                let artists = self.artists_by_id(&ids).await?;
                Ok(tracks_to_items(&tracks, &artists))
            }
        }
    }

    async fn find_artist(&self, name: &str) -> Res<Option<ArtistMatch>> {
        let artists = self.search_artists(name, SEARCH_LIMIT).await?;
        Ok(best_match(name, artists).map(|artist| ArtistMatch {
            matched_name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity.unwrap_or(0),
        }))
    }
}

/// Distinct artist ids of `tracks`, in order of first appearance.
pub fn track_artist_ids(tracks: &[Track]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter_map(|a| a.id.as_ref())
    {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

/// Turns top tracks into listening items.
///
/// A track carries the distinct genres of all of its artists and its own
/// popularity.
pub fn tracks_to_items(tracks: &[Track], artists: &[Artist]) -> Vec<ListeningItem> {
    tracks
        .iter()
        .map(|track| {
            let mut genres: Vec<String> = Vec::new();
            for genre in track
                .artists
                .iter()
                .filter_map(|a| a.id.as_deref())
                .filter_map(|id| artists.iter().find(|artist| artist.id == id))
                .flat_map(|artist| artist.genres.iter())
            {
                if !genres.contains(genre) {
                    genres.push(genre.clone());
                }
            }
            ListeningItem::new(genres, track.popularity)
        })
        .collect()
}

/// Picks the search hit for `name`: an exact case-insensitive name match if
/// there is one, the top hit otherwise.
pub fn best_match(name: &str, artists: Vec<Artist>) -> Option<Artist> {
    let wanted = name.trim().to_lowercase();
    let exact = artists
        .iter()
        .position(|a| a.name.trim().to_lowercase() == wanted);

    match exact {
        Some(index) => artists.into_iter().nth(index),
        None => artists.into_iter().next(),
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
