//! # CLI Module
//!
//! User-facing commands of bandrec. Each command loads what it needs, talks
//! to the lower layers and turns their errors into console output:
//!
//! ```text
//! CLI Layer (console output, exit codes)
//!     ↓
//! Taste Layer (profile, scoring, ranking)
//!     ↓
//! Spotify Layer (auth, Web API)
//! ```
//!
//! ## Commands
//!
//! - [`recommend`] - scores the bands of an input file against the user's
//!   taste, prints the best matches and saves the full ranking as JSON.
//! - [`auth`] - runs the authorization flow and caches the token, so later
//!   runs start without a browser round trip.
//!
//! ## Error Handling
//!
//! Setup failures (missing credentials, unreadable input, failed
//! authentication, failed history fetch) end the process with exit code 1.
//! Bands that cannot be resolved only produce a warning.
//!
//! ## Usage
//!
//! ```bash
//! bandrec auth
//! bandrec bands.txt
//! bandrec bands.txt --source artists --time-range long-term --top 20
//! ```

mod auth;
mod recommend;

pub use auth::auth;
pub use recommend::RecommendRequest;
pub use recommend::recommend;
