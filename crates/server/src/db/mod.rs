//! Database operations for the TicketSlave SQLite store.
//!
//! ## Tables
//!
//! - `users` - Accounts and password hashes
//! - `queues` - Named ticket groupings
//! - `tickets` - Core ticket records
//! - `comments` - Append-only ticket discussion
//! - `attachments` - File metadata (bytes live on disk)
//! - `settings` - Application toggles (key/value)
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/server/migrations/` and run
//! idempotently at startup, or explicitly via:
//! ```bash
//! cargo run -p ticketslave-cli -- migrate
//! ```

pub mod attachments;
pub mod comments;
pub mod queues;
pub mod settings;
pub mod tickets;
pub mod users;

use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use attachments::{AttachmentRepository, NewAttachment};
pub use comments::CommentRepository;
pub use queues::QueueRepository;
pub use settings::SettingsRepository;
pub use tickets::{NewTicket, TicketChanges, TicketFilter, TicketRepository};
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool with sensible defaults.
///
/// The database file (and its parent directory) is created on first run.
/// Foreign keys are enforced and WAL mode keeps readers from blocking the
/// single writer.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = database_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Map a sqlx error to [`RepositoryError::Conflict`] when it is a unique
/// constraint violation, passing everything else through as a database error.
fn map_unique_violation(e: sqlx::Error, conflict_message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(conflict_message.to_owned());
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared helpers for repository tests.

    use super::{MIGRATOR, create_pool};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// Create a migrated pool over a scratch database file.
    ///
    /// The returned `TempDir` keeps the database alive for the test's
    /// duration.
    #[allow(clippy::unwrap_used)]
    pub async fn test_pool() -> (SqlitePool, TempDir) {
        let tmp = TempDir::new().unwrap();
        let pool = create_pool(&tmp.path().join("test.db")).await.unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        (pool, tmp)
    }
}
