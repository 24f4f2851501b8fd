//! CLI command implementations.

pub mod admin;
pub mod migrate;

use thiserror::Error;

use ticketslave_server::config::ConfigError;
use ticketslave_server::services::AuthError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("invalid username: {0}")]
    InvalidUsername(#[from] ticketslave_core::UsernameError),
}
