use crate::{config::Config, error, management::TokenManager, spotify, success};

pub async fn auth() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let token = match spotify::auth::authorize(&config).await {
        Ok(token) => token,
        Err(e) => error!("Authentication failed. Err: {}", e),
    };

    let token_manager = TokenManager::new(token);
    if let Err(e) = token_manager.persist().await {
        error!("Failed to save token to cache: {}", e);
    }

    success!("Authentication successful!");
}
