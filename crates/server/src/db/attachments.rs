//! Attachment metadata repository.
//!
//! Only metadata lives here; the bytes are on disk under the configured
//! upload directory (see `crate::storage`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use ticketslave_core::{AttachmentId, TicketId, UserId};

use super::RepositoryError;
use crate::models::Attachment;

/// Internal row type for attachment queries.
#[derive(Debug, sqlx::FromRow)]
struct AttachmentRow {
    id: i64,
    ticket_id: i64,
    uploader_id: i64,
    original_filename: String,
    stored_filename: String,
    content_type: String,
    size_bytes: i64,
    created_at: DateTime<Utc>,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Self {
            id: AttachmentId::new(row.id),
            ticket_id: TicketId::new(row.ticket_id),
            uploader_id: UserId::new(row.uploader_id),
            original_filename: row.original_filename,
            stored_filename: row.stored_filename,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            created_at: row.created_at,
        }
    }
}

const ATTACHMENT_COLUMNS: &str = "id, ticket_id, uploader_id, original_filename, \
    stored_filename, content_type, size_bytes, created_at";

/// Fields for a new attachment metadata row.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub ticket_id: TicketId,
    pub uploader_id: UserId,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Repository for attachment metadata.
pub struct AttachmentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AttachmentRepository<'a> {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewAttachment) -> Result<Attachment, RepositoryError> {
        let row: AttachmentRow = sqlx::query_as(&format!(
            "INSERT INTO attachments \
             (ticket_id, uploader_id, original_filename, stored_filename, content_type, size_bytes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(new.ticket_id)
        .bind(new.uploader_id)
        .bind(&new.original_filename)
        .bind(&new.stored_filename)
        .bind(&new.content_type)
        .bind(new.size_bytes)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get attachment metadata by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, RepositoryError> {
        let row: Option<AttachmentRow> = sqlx::query_as(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a ticket's attachments in upload order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        let rows: Vec<AttachmentRow> = sqlx::query_as(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
             WHERE ticket_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(ticket_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
