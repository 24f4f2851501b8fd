//! Attachment service.
//!
//! Validates uploads against the configured size and extension limits,
//! hands the bytes to the [`AttachmentStore`](crate::storage::AttachmentStore),
//! and records the metadata row. Downloads re-open the stored file and
//! restore the original filename and content type.

use std::path::Path;

use thiserror::Error;
use tokio::fs::File;

use ticketslave_core::{AttachmentId, TicketId, UserId};

use crate::config::ServerConfig;
use crate::db::{AttachmentRepository, NewAttachment, RepositoryError, TicketRepository};
use crate::models::Attachment;
use crate::state::AppState;
use crate::storage::AttachmentStore;

/// Errors that can occur during attachment operations.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Ticket does not exist.
    #[error("ticket not found")]
    TicketNotFound,

    /// Attachment row or file does not exist.
    #[error("attachment not found")]
    NotFound,

    /// Upload exceeds the configured size limit.
    #[error("file exceeds the maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },

    /// Upload extension is not on the configured allowlist.
    #[error("file type is not allowed")]
    ExtensionNotAllowed,

    /// Filesystem failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Attachment service.
pub struct AttachmentService<'a> {
    tickets: TicketRepository<'a>,
    attachments: AttachmentRepository<'a>,
    store: &'a AttachmentStore,
    config: &'a ServerConfig,
}

impl<'a> AttachmentService<'a> {
    /// Create a new attachment service over the shared application state.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            tickets: TicketRepository::new(state.pool()),
            attachments: AttachmentRepository::new(state.pool()),
            store: state.attachments(),
            config: state.config(),
        }
    }

    /// Store uploaded bytes for a ticket and record their metadata.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::TicketNotFound` if the ticket doesn't exist,
    /// `AttachmentError::TooLarge` / `AttachmentError::ExtensionNotAllowed`
    /// when the upload fails validation.
    pub async fn upload(
        &self,
        ticket_id: TicketId,
        uploader_id: UserId,
        original_filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<Attachment, AttachmentError> {
        if bytes.len() as u64 > self.config.max_upload_bytes {
            return Err(AttachmentError::TooLarge {
                max_bytes: self.config.max_upload_bytes,
            });
        }

        let extension = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str());
        if !self.config.is_extension_allowed(extension) {
            return Err(AttachmentError::ExtensionNotAllowed);
        }

        if self.tickets.get_by_id(ticket_id).await?.is_none() {
            return Err(AttachmentError::TicketNotFound);
        }

        let stored = self.store.save(ticket_id, original_filename, bytes).await?;

        let attachment = self
            .attachments
            .create(&NewAttachment {
                ticket_id,
                uploader_id,
                original_filename: original_filename.to_owned(),
                stored_filename: stored.stored_filename,
                content_type: content_type.to_owned(),
                size_bytes: stored.size_bytes,
            })
            .await?;

        Ok(attachment)
    }

    /// Open an attachment for download.
    ///
    /// Returns the metadata (original filename, content type) together with
    /// the opened file so the route can stream it.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::NotFound` if the metadata row or the file
    /// on disk is missing.
    pub async fn download(&self, id: AttachmentId) -> Result<(Attachment, File), AttachmentError> {
        let attachment = self
            .attachments
            .get_by_id(id)
            .await?
            .ok_or(AttachmentError::NotFound)?;

        let path = self.store.path_for(&attachment.stored_filename);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(
                    attachment_id = %id,
                    path = %path.display(),
                    "attachment row exists but file is missing"
                );
                return Err(AttachmentError::NotFound);
            }
            Err(e) => return Err(AttachmentError::Storage(e)),
        };

        Ok((attachment, file))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::QueueRepository;
    use crate::models::CurrentUser;
    use crate::services::auth::AuthService;
    use crate::services::tickets::{CreateTicket, TicketService};
    use crate::test_support::test_state;
    use ticketslave_core::{Priority, Role};
    use tokio::io::AsyncReadExt;

    async fn setup() -> (AppState, CurrentUser, TicketId, tempfile::TempDir) {
        let (state, tmp) = test_state().await;
        let user = AuthService::new(state.pool())
            .register("alice", "password1")
            .await
            .unwrap();
        let queue = QueueRepository::new(state.pool())
            .create("IT", "")
            .await
            .unwrap();
        let alice = CurrentUser {
            id: user.id,
            username: user.username,
            role: Role::Regular,
        };
        let ticket = TicketService::new(&state)
            .create(
                &alice,
                CreateTicket {
                    title: "Printer broken".to_string(),
                    description: String::new(),
                    queue_id: queue.id,
                    priority: Priority::Medium,
                    deadline: None,
                    assigned_to: None,
                },
            )
            .await
            .unwrap();
        (state, alice, ticket.id, tmp)
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let (state, alice, ticket_id, _tmp) = setup().await;
        let service = AttachmentService::new(&state);

        let payload = b"error log contents".to_vec();
        let attachment = service
            .upload(ticket_id, alice.id, "printer.log", "text/plain", &payload)
            .await
            .unwrap();

        assert_eq!(attachment.original_filename, "printer.log");
        assert_eq!(attachment.size_bytes, payload.len() as i64);

        let (meta, mut file) = service.download(attachment.id).await.unwrap();
        assert_eq!(meta.content_type, "text/plain");

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, payload);
    }

    #[tokio::test]
    async fn test_size_limit_enforced() {
        let (state, alice, ticket_id, _tmp) = setup().await;
        let service = AttachmentService::new(&state);

        let oversized = vec![0u8; state.config().max_upload_bytes as usize + 1];
        let err = service
            .upload(ticket_id, alice.id, "big.log", "text/plain", &oversized)
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_extension_allowlist_enforced() {
        let (state, alice, ticket_id, _tmp) = setup().await;
        let service = AttachmentService::new(&state);

        let err = service
            .upload(ticket_id, alice.id, "run.exe", "application/x-msdownload", b"MZ")
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::ExtensionNotAllowed));
    }

    #[tokio::test]
    async fn test_download_missing() {
        let (state, _alice, _ticket_id, _tmp) = setup().await;
        let service = AttachmentService::new(&state);

        assert!(matches!(
            service.download(AttachmentId::new(999)).await,
            Err(AttachmentError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_upload_to_missing_ticket() {
        let (state, alice, _ticket_id, _tmp) = setup().await;
        let service = AttachmentService::new(&state);

        let err = service
            .upload(TicketId::new(999), alice.id, "a.txt", "text/plain", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::TicketNotFound));
    }
}
