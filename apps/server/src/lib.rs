//! # FarmaSys Server
//!
//! JSON-over-HTTP backend for the pharmacy counter.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          FarmaSys Server                                │
//! │                                                                         │
//! │  Counter UI ───► axum (5000) ───► routes ───► farmasys-db ───► SQLite  │
//! │                     │                             │                     │
//! │                     ▼                             ▼                     │
//! │              CurrentUser (JWT)            farmasys-core (checkout,      │
//! │                                           money, validation)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`]: TOML file plus `FARMASYS_*` environment overrides
//! - [`auth`]: JWT issuing and the `CurrentUser` extractor
//! - [`error`]: the `{ok: false, error, code}` envelope
//! - [`routes`]: the HTTP surface
//! - [`state`]: shared handles passed to handlers

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=farmasys=trace` - Show trace for farmasys crates only
/// - Default: INFO, DEBUG for farmasys, WARN for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,farmasys=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
