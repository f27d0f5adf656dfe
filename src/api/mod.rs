//! # API Module
//!
//! HTTP endpoints of the short-lived local server that receives Spotify's
//! OAuth redirect during `bandrec auth`.
//!
//! ## Endpoints
//!
//! - [`callback`] - stores the authorization code of the pending
//!   authorization after checking the `state` parameter.
//! - [`health`] - reports status, name and version, handy to check that
//!   the redirect URI points at the running server.
//!
//! ## Related Modules
//!
//! - [`crate::server`] - router and listener setup
//! - [`crate::spotify::auth`] - the flow that waits for the callback

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
