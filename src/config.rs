//! Configuration management for the band recommender.
//!
//! This module handles loading configuration values from environment
//! variables and `.env` files. The Spotify application credentials are the
//! only required values; endpoints, the callback server address and the
//! request policy all fall back to sensible defaults.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the current working directory
//! 4. Application defaults (where applicable)

use std::{env, fmt, path::PathBuf, time::Duration};

pub const CLIENT_ID_VAR: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_API_AUTH_CLIENT_SECRET";
pub const REDIRECT_URI_VAR: &str = "SPOTIFY_API_REDIRECT_URI";
pub const SERVER_ADDRESS_VAR: &str = "SERVER_ADDRESS";
pub const AUTH_URL_VAR: &str = "SPOTIFY_API_AUTH_URL";
pub const TOKEN_URL_VAR: &str = "SPOTIFY_API_TOKEN_URL";
pub const API_URL_VAR: &str = "SPOTIFY_API_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "BANDREC_REQUEST_TIMEOUT_SECS";
pub const LOOKUP_DELAY_VAR: &str = "BANDREC_LOOKUP_DELAY_MS";
pub const MAX_ATTEMPTS_VAR: &str = "BANDREC_MAX_ATTEMPTS";

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOOKUP_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Scope needed to read the user's top tracks and artists.
pub const SPOTIFY_SCOPE: &str = "user-top-read";

/// Errors raised while assembling the [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(
                f,
                "Missing required environment variable {var}. Add it to your environment or .env file."
            ),
            ConfigError::Invalid { var, value } => {
                write!(f, "Invalid value '{value}' for environment variable {var}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Spotify application credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Runtime configuration of a bandrec run.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub redirect_uri: String,
    pub server_address: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Upper bound for every single HTTP request.
    pub request_timeout: Duration,
    /// Pause between two candidate lookups.
    pub lookup_delay: Duration,
    /// Total attempts for a request answered with a transient status.
    pub max_attempts: u32,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated like absent ones. The client id, secret and
    /// redirect URI also accept the `SPOTIPY_*` names used by spotipy based
    /// tooling, so existing `.env` files keep working.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_any = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        let client_id = get_any(&[CLIENT_ID_VAR, "SPOTIPY_CLIENT_ID"])
            .ok_or(ConfigError::Missing(CLIENT_ID_VAR))?;
        let client_secret = get_any(&[CLIENT_SECRET_VAR, "SPOTIPY_CLIENT_SECRET"])
            .ok_or(ConfigError::Missing(CLIENT_SECRET_VAR))?;

        let request_timeout_secs = parse_number(
            get(REQUEST_TIMEOUT_VAR),
            REQUEST_TIMEOUT_VAR,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: REQUEST_TIMEOUT_VAR,
                value: "0".to_string(),
            });
        }
        let lookup_delay_ms =
            parse_number(get(LOOKUP_DELAY_VAR), LOOKUP_DELAY_VAR, DEFAULT_LOOKUP_DELAY_MS)?;
        let max_attempts = parse_number(
            get(MAX_ATTEMPTS_VAR),
            MAX_ATTEMPTS_VAR,
            DEFAULT_MAX_ATTEMPTS as u64,
        )?
        .clamp(1, 10) as u32;

        Ok(Config {
            credentials: Credentials {
                client_id: client_id.trim().to_string(),
                client_secret: client_secret.trim().to_string(),
            },
            redirect_uri: get_any(&[REDIRECT_URI_VAR, "SPOTIPY_REDIRECT_URI"])
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            server_address: get(SERVER_ADDRESS_VAR)
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            auth_url: get(AUTH_URL_VAR).unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get(TOKEN_URL_VAR).unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_url: get(API_URL_VAR)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            request_timeout: Duration::from_secs(request_timeout_secs),
            lookup_delay: Duration::from_millis(lookup_delay_ms),
            max_attempts,
        })
    }
}

fn parse_number(raw: Option<String>, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Returns the directory holding bandrec's `.env`, token cache and state.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("bandrec");
    path
}

/// Loads environment variables from `.env` files.
///
/// Reads `<data_local_dir>/bandrec/.env` first and the working directory's
/// `.env` second. `dotenv` never overrides variables that are already set,
/// so the real environment always wins. Missing files are not an error.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| e.to_string())?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    }

    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}
