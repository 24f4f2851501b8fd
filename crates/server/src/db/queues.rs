//! Queue repository for database operations.

use sqlx::SqlitePool;

use ticketslave_core::QueueId;

use super::{RepositoryError, map_unique_violation};
use crate::models::Queue;

/// Internal row type for queue queries.
#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: i64,
    name: String,
    description: String,
}

impl From<QueueRow> for Queue {
    fn from(row: QueueRow) -> Self {
        Self {
            id: QueueId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

/// Repository for queue database operations.
pub struct QueueRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> QueueRepository<'a> {
    /// Create a new queue repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all queues, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Queue>, RepositoryError> {
        let rows: Vec<QueueRow> =
            sqlx::query_as("SELECT id, name, description FROM queues ORDER BY name ASC")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a queue by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: QueueId) -> Result<Option<Queue>, RepositoryError> {
        let row: Option<QueueRow> =
            sqlx::query_as("SELECT id, name, description FROM queues WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, name: &str, description: &str) -> Result<Queue, RepositoryError> {
        let row: QueueRow = sqlx::query_as(
            "INSERT INTO queues (name, description) VALUES (?, ?) \
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "queue name already exists"))?;

        Ok(row.into())
    }

    /// Update a queue's name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the queue doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: QueueId,
        name: &str,
        description: &str,
    ) -> Result<Queue, RepositoryError> {
        let row: Option<QueueRow> = sqlx::query_as(
            "UPDATE queues SET name = ?, description = ? WHERE id = ? \
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "queue name already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Count tickets currently in a queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ticket_count(&self, id: QueueId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE queue_id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a queue.
    ///
    /// Callers must check [`Self::ticket_count`] first; the schema restricts
    /// deletion while tickets reference the queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the queue doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: QueueId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM queues WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[tokio::test]
    async fn test_create_list_update_delete() {
        let (pool, _tmp) = test_pool().await;
        let repo = QueueRepository::new(&pool);

        let it = repo.create("IT", "Hardware and software").await.unwrap();
        repo.create("Facilities", "").await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by name
        assert_eq!(all[0].name, "Facilities");

        let updated = repo.update(it.id, "IT Support", "Renamed").await.unwrap();
        assert_eq!(updated.name, "IT Support");

        repo.delete(it.id).await.unwrap();
        assert!(repo.get_by_id(it.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (pool, _tmp) = test_pool().await;
        let repo = QueueRepository::new(&pool);

        repo.create("IT", "").await.unwrap();
        let err = repo.create("IT", "again").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
