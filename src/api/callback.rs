use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};

use crate::{types::SharedAuth, warning};

/// Receives Spotify's redirect after the user answered the consent page.
///
/// Only requests echoing the `state` of the pending authorization are
/// accepted. The code itself is exchanged by the waiting authorization flow.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<SharedAuth>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pending) = state.as_mut() else {
        return Html("<h4>No authorization in progress.</h4>");
    };

    if params.get("state") != Some(&pending.state) {
        warning!("Ignoring callback with unexpected state parameter.");
        return Html("<h4>Invalid state parameter.</h4>");
    }

    if let Some(error) = params.get("error") {
        pending.error = Some(error.clone());
        return Html("<h4>Authorization denied.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            pending.code = Some(code.clone());
            Html("<h2>Authorization successful.</h2><p>Close this window and return to the terminal.</p>")
        }
        None => Html("<h4>Missing authorization code.</h4>"),
    }
}
