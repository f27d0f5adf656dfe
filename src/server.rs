use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr};
use tokio::net::TcpListener;

use crate::{Res, api, types::SharedAuth};

/// Routes of the local OAuth callback server.
pub fn router(state: SharedAuth) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)))
}

/// Binds the callback server's socket.
///
/// Binding happens before the browser is opened so that a taken port is
/// reported instead of leaving the user on a dead redirect.
pub async fn bind(address: &str) -> Res<TcpListener> {
    let addr = SocketAddr::from_str(address)
        .map_err(|e| format!("Failed to parse server address '{}': {}", address, e))?;
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind callback server to {}: {}", addr, e))?;
    Ok(listener)
}

pub async fn serve(listener: TcpListener, state: SharedAuth) -> Res<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}
