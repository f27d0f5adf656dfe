use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use bandrec::{
    config::{Config, Credentials},
    management::TokenManager,
    spotify::{self, SpotifyClient, auth},
    taste::{HistoryRequest, MusicCatalog, TimeRange, TopSource},
    types::{Artist, SimplifiedArtist, Token, TokenResponse, Track},
};

const ACCESS_TOKEN: &str = "test-access-token";

// Serves `router` on an ephemeral local port and returns its base url
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, max_attempts: u32) -> SpotifyClient {
    SpotifyClient::with_base_url(base_url, ACCESS_TOKEN, Duration::from_secs(5), max_attempts)
        .unwrap()
}

fn config_with_token_url(token_url: &str) -> Config {
    let token_url = token_url.to_string();
    Config::from_lookup(move |key| match key {
        "SPOTIFY_API_AUTH_CLIENT_ID" => Some("client".to_string()),
        "SPOTIFY_API_AUTH_CLIENT_SECRET" => Some("secret".to_string()),
        "SPOTIFY_API_TOKEN_URL" => Some(token_url.clone()),
        _ => None,
    })
    .unwrap()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ACCESS_TOKEN))
        .unwrap_or(false)
}

fn artist(id: &str, name: &str, genres: &[&str], popularity: u32) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        popularity: Some(popularity),
    }
}

fn track(name: &str, artist_ids: &[&str], popularity: u32) -> Track {
    Track {
        id: Some(format!("{}-id", name)),
        name: name.to_string(),
        popularity: Some(popularity),
        artists: artist_ids
            .iter()
            .map(|id| SimplifiedArtist {
                id: Some(id.to_string()),
                name: id.to_uppercase(),
            })
            .collect(),
    }
}

async fn top_tracks(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    assert_eq!(params.get("time_range").map(String::as_str), Some("medium_term"));
    assert_eq!(params.get("limit").map(String::as_str), Some("3"));

    Json(json!({
        "items": [
            { "id": "t1", "name": "One", "popularity": 80, "artists": [{ "id": "a1", "name": "A1" }] },
            { "id": "t2", "name": "Two", "popularity": 40, "artists": [{ "id": "a1", "name": "A1" }, { "id": "a2", "name": "A2" }] },
            { "id": "t3", "name": "Three", "popularity": null, "artists": [{ "id": "gone", "name": "Gone" }] }
        ],
        "total": 3,
        "next": null
    }))
    .into_response()
}

async fn several_artists(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let ids = params.get("ids").cloned().unwrap_or_default();
    assert_eq!(ids, "a1,a2,gone");

    Json(json!({
        "artists": [
            { "id": "a1", "name": "A1", "genres": ["Rock", "indie"], "popularity": 70 },
            { "id": "a2", "name": "A2", "genres": ["indie", "shoegaze"], "popularity": 30 },
            null
        ]
    }))
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("type").map(String::as_str), Some("artist"));
    let items = match params.get("q").map(String::as_str) {
        Some("the beatles") => json!([
            { "id": "x", "name": "The Beatles Revival Band", "genres": ["covers"], "popularity": 12 },
            { "id": "y", "name": "The Beatles", "genres": ["british invasion", "rock"], "popularity": 88 }
        ]),
        Some("beatls") => json!([
            { "id": "y", "name": "The Beatles", "genres": ["rock"], "popularity": 88 }
        ]),
        _ => json!([]),
    };

    Json(json!({ "artists": { "items": items, "total": 0, "next": null } }))
}

fn fake_spotify() -> Router {
    Router::new()
        .route("/me/top/tracks", get(top_tracks))
        .route("/artists", get(several_artists))
        .route("/search", get(search))
}

#[tokio::test]
async fn test_listening_history_from_top_tracks() {
    let base_url = spawn_server(fake_spotify()).await;
    let client = client(&base_url, 1);
    let request = HistoryRequest {
        source: TopSource::Tracks,
        time_range: TimeRange::MediumTerm,
        limit: 3,
    };

    let items = client.listening_history(&request).await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].genres, vec!["Rock", "indie"]);
    assert_eq!(items[0].popularity, Some(80));
    // genres of both artists, "indie" only once
    assert_eq!(items[1].genres, vec!["Rock", "indie", "shoegaze"]);
    // unknown artist and missing popularity
    assert!(items[2].genres.is_empty());
    assert_eq!(items[2].popularity, None);
}

#[tokio::test]
async fn test_listening_history_from_top_artists() {
    let router = Router::new().route(
        "/me/top/artists",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("time_range").map(String::as_str), Some("short_term"));
            Json(json!({
                "items": [
                    { "id": "a1", "name": "A1", "genres": ["rock"], "popularity": 70 },
                    { "id": "a2", "name": "A2", "popularity": 20 }
                ],
                "total": 2,
                "next": null
            }))
        }),
    );
    let base_url = spawn_server(router).await;
    let request = HistoryRequest {
        source: TopSource::Artists,
        ..HistoryRequest::default()
    };

    let items = client(&base_url, 1)
        .listening_history(&request)
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].genres, vec!["rock"]);
    assert!(items[1].genres.is_empty());
    assert_eq!(items[1].popularity, Some(20));
}

#[tokio::test]
async fn test_find_artist_prefers_exact_match() {
    let base_url = spawn_server(fake_spotify()).await;
    let client = client(&base_url, 1);

    let exact = client.find_artist("the beatles").await.unwrap().unwrap();
    let fuzzy = client.find_artist("beatls").await.unwrap().unwrap();
    let missing = client.find_artist("zzzz").await.unwrap();

    assert_eq!(exact.matched_name, "The Beatles");
    assert_eq!(exact.popularity, 88);
    assert_eq!(fuzzy.matched_name, "The Beatles");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_unauthorized_request_fails_with_hint() {
    let base_url = spawn_server(fake_spotify()).await;
    let client =
        SpotifyClient::with_base_url(&base_url, "wrong", Duration::from_secs(5), 1).unwrap();
    let request = HistoryRequest {
        time_range: TimeRange::MediumTerm,
        limit: 3,
        ..HistoryRequest::default()
    };

    let err = client.listening_history(&request).await.unwrap_err();

    assert!(err.to_string().contains("bandrec auth"));
}

#[tokio::test]
async fn test_transient_status_is_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/search",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::BAD_GATEWAY, [(RETRY_AFTER, "0")]).into_response()
                } else {
                    Json(json!({ "artists": { "items": [
                        { "id": "1", "name": "Low", "genres": ["slowcore"], "popularity": 48 }
                    ] } }))
                    .into_response()
                }
            }),
        )
        .with_state(Arc::clone(&hits));
    let base_url = spawn_server(router).await;

    let found = client(&base_url, 3).find_artist("Low").await.unwrap();

    assert_eq!(found.unwrap().genres, vec!["slowcore"]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retries_stop_after_max_attempts() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/search",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "0")]).into_response()
            }),
        )
        .with_state(Arc::clone(&hits));
    let base_url = spawn_server(router).await;

    let result = client(&base_url, 2).find_artist("Low").await;

    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_request_timeout_is_enforced() {
    let router = Router::new().route(
        "/search",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "artists": { "items": [] } }))
        }),
    );
    let base_url = spawn_server(router).await;
    let client =
        SpotifyClient::with_base_url(&base_url, ACCESS_TOKEN, Duration::from_millis(200), 1)
            .unwrap();

    let result = client.find_artist("Low").await;

    assert!(result.is_err());
}

#[test]
fn test_track_artist_ids_are_distinct_and_ordered() {
    let tracks = vec![
        track("one", &["b", "a"], 10),
        track("two", &["a", "c"], 20),
    ];

    assert_eq!(spotify::track_artist_ids(&tracks), vec!["b", "a", "c"]);
}

#[test]
fn test_tracks_to_items_uses_track_popularity() {
    let tracks = vec![track("one", &["a"], 33)];
    let artists = vec![artist("a", "A", &["dream pop"], 90)];

    let items = spotify::tracks_to_items(&tracks, &artists);

    assert_eq!(items[0].genres, vec!["dream pop"]);
    assert_eq!(items[0].popularity, Some(33));
}

#[test]
fn test_best_match_falls_back_to_first_hit() {
    let hits = vec![
        artist("1", "Sigur Rós", &["post-rock"], 60),
        artist("2", "Sigur Ros Tribute", &[], 5),
    ];

    assert_eq!(spotify::best_match("sigur ros", hits.clone()).unwrap().id, "1");
    assert_eq!(spotify::best_match("SIGUR RÓS ", hits).unwrap().id, "1");
    assert!(spotify::best_match("x", Vec::new()).is_none());
}

#[test]
fn test_basic_auth_header() {
    let credentials = Credentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
    };

    // base64("client:secret")
    assert_eq!(
        auth::basic_auth_header(&credentials),
        "Basic Y2xpZW50OnNlY3JldA=="
    );
}

#[test]
fn test_token_from_response_keeps_previous_refresh_token() {
    let response = TokenResponse {
        access_token: "new".to_string(),
        refresh_token: None,
        scope: "user-top-read".to_string(),
        expires_in: 3600,
    };

    let token = auth::token_from_response(response, Some("old-refresh"));

    assert_eq!(token.access_token, "new");
    assert_eq!(token.refresh_token, "old-refresh");
    assert_eq!(token.expires_in, 3600);
}

#[test]
fn test_authorize_url_carries_scope_and_state() {
    let config = config_with_token_url("http://127.0.0.1:1/api/token");

    let url = auth::authorize_url(&config, "xyz").unwrap();
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert!(url.as_str().starts_with("https://accounts.spotify.com/authorize?"));
    assert_eq!(params["client_id"], "client");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "user-top-read");
    assert_eq!(params["state"], "xyz");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8888/callback");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let router = Router::new().route(
        "/api/token",
        post(
            |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Basic Y2xpZW50OnNlY3JldA==" {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                assert_eq!(form["grant_type"], "refresh_token");
                assert_eq!(form["refresh_token"], "refresh-1");
                Json(json!({
                    "access_token": "access-2",
                    "token_type": "Bearer",
                    "scope": "user-top-read",
                    "expires_in": 3600
                }))
                .into_response()
            },
        ),
    );
    let base_url = spawn_server(router).await;
    let config = config_with_token_url(&format!("{}/api/token", base_url));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let expired = Token {
        access_token: "access-1".to_string(),
        refresh_token: "refresh-1".to_string(),
        scope: "user-top-read".to_string(),
        expires_in: 3600,
        obtained_at: 0,
    };
    let mut token_mgr = TokenManager::with_path(expired, path.clone());

    let access_token = token_mgr.get_valid_token(&config).await.unwrap();

    assert_eq!(access_token, "access-2");
    let reloaded = TokenManager::load_from(path).await.unwrap();
    assert_eq!(reloaded.current_token().access_token, "access-2");
    assert_eq!(reloaded.current_token().refresh_token, "refresh-1");
}
