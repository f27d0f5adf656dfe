use std::path::PathBuf;

use chrono::Utc;

use crate::{Res, config, spotify, types::Token};

/// Seconds before the nominal expiry at which a token is refreshed.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Keeps the OAuth token on disk between runs and refreshes it on demand.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        Self::with_path(token, Self::token_path())
    }

    pub fn with_path(token: Token, path: PathBuf) -> Self {
        TokenManager { token, path }
    }

    pub async fn load() -> Result<Self, String> {
        Self::load_from(Self::token_path()).await
    }

    pub async fn load_from(path: PathBuf) -> Result<Self, String> {
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token, path })
    }

    pub async fn persist(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns the access token, refreshing and re-persisting it first when
    /// it is about to expire.
    pub async fn get_valid_token(&mut self, config: &config::Config) -> Res<String> {
        if self.is_expired() {
            if self.token.refresh_token.is_empty() {
                return Err("token expired and no refresh token is available".into());
            }
            self.token = spotify::auth::refresh_token(config, &self.token.refresh_token).await?;
            let _ = self.persist().await;
        }

        Ok(self.token.access_token.clone())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u64)
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        let expires_at = self.token.obtained_at + self.token.expires_in;
        now >= expires_at.saturating_sub(EXPIRY_MARGIN_SECS)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.token.scope.split_whitespace().any(|s| s == scope)
    }

    pub fn token_path() -> PathBuf {
        let mut path = config::data_dir();
        path.push("cache/token.json");
        path
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}
