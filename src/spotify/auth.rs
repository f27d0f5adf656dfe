use std::{sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::Url;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    Res,
    config::{Config, Credentials, SPOTIFY_SCOPE},
    info,
    management::TokenManager,
    server,
    types::{PendingAuth, SharedAuth, Token, TokenResponse},
    utils, warning,
};

use super::http_client;

/// How long the user gets to approve the authorization in the browser.
const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Returns a usable access token for this run.
///
/// Reuses the cached token when it carries the required scope, refreshing it
/// if it is about to expire. Otherwise the interactive authorization flow is
/// started and its token cached for the next runs.
pub async fn access_token(config: &Config) -> Res<String> {
    if let Ok(mut token_mgr) = TokenManager::load().await {
        if token_mgr.has_scope(SPOTIFY_SCOPE) {
            match token_mgr.get_valid_token(config).await {
                Ok(token) => return Ok(token),
                Err(e) => warning!("Cached token cannot be refreshed, re-authorizing. Err: {}", e),
            }
        }
    }

    let token = authorize(config).await?;
    let token_mgr = TokenManager::new(token);
    if let Err(e) = token_mgr.persist().await {
        warning!("Failed to save token to cache: {}", e);
    }
    Ok(token_mgr.current_token().access_token.clone())
}

/// Runs the authorization code flow and returns the obtained token.
///
/// Starts the local callback server, sends the user to Spotify's consent
/// page and waits for the redirect carrying the authorization code.
pub async fn authorize(config: &Config) -> Res<Token> {
    let state = utils::generate_state();
    let shared_state: SharedAuth = Arc::new(Mutex::new(Some(PendingAuth {
        state: state.clone(),
        code: None,
        error: None,
    })));

    let listener = server::bind(&config.server_address).await?;
    let server_state = Arc::clone(&shared_state);
    let server = tokio::spawn(async move { server::serve(listener, server_state).await });

    let auth_url = authorize_url(config, &state)?;
    info!("Opening the browser to authorize bandrec with Spotify...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let code = wait_for_code(shared_state, AUTHORIZATION_TIMEOUT).await;
    server.abort();

    exchange_code(config, &code?).await
}

/// URL of Spotify's consent page for this application.
pub fn authorize_url(config: &Config, state: &str) -> Res<Url> {
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", SPOTIFY_SCOPE),
            ("state", state),
        ],
    )?;
    Ok(url)
}

/// Polls the shared state until the callback delivered a code or an error.
pub async fn wait_for_code(shared_state: SharedAuth, max_wait: Duration) -> Res<String> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        {
            let lock = shared_state.lock().await;
            if let Some(pending) = lock.as_ref() {
                if let Some(error) = &pending.error {
                    return Err(format!("Spotify denied the authorization: {}", error).into());
                }
                if let Some(code) = &pending.code {
                    return Ok(code.clone());
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Err("Authorization timed out.".into())
}

pub async fn exchange_code(config: &Config, code: &str) -> Res<Token> {
    let response = request_token(
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )
    .await?;

    Ok(token_from_response(response, None))
}

/// Trades a refresh token for a new access token.
///
/// Spotify may omit the refresh token in the answer; the old one stays valid
/// then.
pub async fn refresh_token(config: &Config, refresh_token: &str) -> Res<Token> {
    let response = request_token(
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await?;

    Ok(token_from_response(response, Some(refresh_token)))
}

async fn request_token(config: &Config, form: &[(&str, &str)]) -> Res<TokenResponse> {
    let client = http_client(config.request_timeout)?;
    let res = client
        .post(&config.token_url)
        .header("Authorization", basic_auth_header(&config.credentials))
        .form(form)
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("token request failed: {} - {}", status, body).into());
    }

    Ok(res.json::<TokenResponse>().await?)
}

/// `Authorization` header value for the token endpoint.
pub fn basic_auth_header(credentials: &Credentials) -> String {
    let encoded = STANDARD.encode(
        format!("{}:{}", credentials.client_id, credentials.client_secret).as_bytes(),
    );
    format!("Basic {}", encoded)
}

pub fn token_from_response(response: TokenResponse, previous_refresh: Option<&str>) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default(),
        scope: response.scope,
        expires_in: response.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    }
}
