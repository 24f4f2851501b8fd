//! TicketSlave server library.
//!
//! This crate provides the ticket tracker as a library, allowing it to be
//! tested in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions::service::SignedCookie;
use tower_sessions_sqlx_store::SqliteStore;

use crate::state::AppState;

/// Extra body-limit headroom on top of the attachment size limit, covering
/// multipart framing overhead.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Assemble the full application router.
///
/// Everything except the outermost Sentry layers (added by `main`, which
/// owns the Sentry guard) lives here so tests drive the same stack as
/// production.
#[must_use]
pub fn app(
    state: AppState,
    session_layer: SessionManagerLayer<SqliteStore, SignedCookie>,
) -> Router {
    let body_limit = usize::try_from(state.config().max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::router())
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared helpers for service-level tests.

    use secrecy::SecretString;
    use tempfile::TempDir;

    use crate::config::ServerConfig;
    use crate::db;
    use crate::state::AppState;

    /// Build a migrated [`AppState`] over a scratch directory.
    #[allow(clippy::unwrap_used)]
    pub async fn test_state() -> (AppState, TempDir) {
        let tmp = TempDir::new().unwrap();
        let config = ServerConfig {
            database_path: tmp.path().join("test.db"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost".to_string(),
            session_secret: SecretString::from("0123456789abcdef0123456789abcdef"),
            upload_dir: tmp.path().join("uploads"),
            max_upload_bytes: 64 * 1024,
            allowed_extensions: ["log", "pdf", "png", "txt"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            allow_reopen: true,
            sentry_dsn: None,
        };

        let pool = db::create_pool(&config.database_path).await.unwrap();
        db::MIGRATOR.run(&pool).await.unwrap();

        (AppState::new(config, pool), tmp)
    }
}
