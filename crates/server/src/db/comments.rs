//! Comment repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use ticketslave_core::{CommentId, TicketId, UserId, Username};

use super::RepositoryError;
use crate::models::Comment;

/// Internal row type for comment queries with the author name joined in.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    ticket_id: i64,
    author_id: i64,
    author_username: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let author_username = Username::parse(&row.author_username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: CommentId::new(row.id),
            ticket_id: TicketId::new(row.ticket_id),
            author_id: UserId::new(row.author_id),
            author_username,
            body: row.body,
            created_at: row.created_at,
        })
    }
}

const COMMENT_SELECT: &str = "SELECT c.id, c.ticket_id, c.author_id, \
    u.username AS author_username, c.body, c.created_at \
    FROM comments c \
    JOIN users u ON u.id = c.author_id";

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a comment to a ticket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// foreign key violations for a missing ticket or author).
    pub async fn create(
        &self,
        ticket_id: TicketId,
        author_id: UserId,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (ticket_id, author_id, body, created_at) \
             VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(ticket_id)
        .bind(author_id)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(CommentId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a comment by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row: Option<CommentRow> = sqlx::query_as(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a ticket's comments in creation order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "{COMMENT_SELECT} WHERE c.ticket_id = ? ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(ticket_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
