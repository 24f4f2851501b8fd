//! Application settings repository (key/value toggles).

use sqlx::SqlitePool;

use super::RepositoryError;

/// Setting key: whether self-service registration is open.
pub const ALLOW_REGISTRATION: &str = "allow_registration";

/// Repository for application settings.
pub struct SettingsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a setting value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// Set (insert or replace) a setting value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Whether self-service registration is currently open.
    ///
    /// A missing row counts as open; only an explicit '0' closes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn allow_registration(&self) -> Result<bool, RepositoryError> {
        Ok(self
            .get(ALLOW_REGISTRATION)
            .await?
            .is_none_or(|value| value == "1"))
    }

    /// Open or close self-service registration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_allow_registration(&self, allowed: bool) -> Result<(), RepositoryError> {
        self.set(ALLOW_REGISTRATION, if allowed { "1" } else { "0" })
            .await
    }
}
