//! Comment service.
//!
//! Comments are append-only: created, listed oldest-first, never edited.

use thiserror::Error;

use ticketslave_core::TicketId;

use crate::db::{CommentRepository, RepositoryError, TicketRepository};
use crate::events::{EventSink, TicketEvent};
use crate::models::{Comment, CurrentUser};
use crate::state::AppState;

/// Errors that can occur during comment operations.
#[derive(Debug, Error)]
pub enum CommentError {
    /// Ticket does not exist.
    #[error("ticket not found")]
    TicketNotFound,

    /// Comment body was empty or whitespace-only.
    #[error("comment body cannot be empty")]
    EmptyBody,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Comment service.
pub struct CommentService<'a> {
    tickets: TicketRepository<'a>,
    comments: CommentRepository<'a>,
    events: &'a dyn EventSink,
}

impl<'a> CommentService<'a> {
    /// Create a new comment service over the shared application state.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            tickets: TicketRepository::new(state.pool()),
            comments: CommentRepository::new(state.pool()),
            events: state.events(),
        }
    }

    /// Append a comment to a ticket.
    ///
    /// # Errors
    ///
    /// Returns `CommentError::TicketNotFound` if the ticket doesn't exist.
    /// Returns `CommentError::EmptyBody` if the body is blank.
    pub async fn append(
        &self,
        ticket_id: TicketId,
        author: &CurrentUser,
        body: &str,
    ) -> Result<Comment, CommentError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CommentError::EmptyBody);
        }

        if self.tickets.get_by_id(ticket_id).await?.is_none() {
            return Err(CommentError::TicketNotFound);
        }

        let comment = self.comments.create(ticket_id, author.id, body).await?;

        self.events.publish(&TicketEvent::Commented {
            ticket_id,
            actor_id: author.id,
            comment_id: comment.id,
        });

        Ok(comment)
    }

    /// List a ticket's comments in creation order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns `CommentError::TicketNotFound` if the ticket doesn't exist.
    pub async fn list(&self, ticket_id: TicketId) -> Result<Vec<Comment>, CommentError> {
        if self.tickets.get_by_id(ticket_id).await?.is_none() {
            return Err(CommentError::TicketNotFound);
        }
        Ok(self.comments.list_for_ticket(ticket_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::QueueRepository;
    use crate::services::auth::AuthService;
    use crate::services::tickets::{CreateTicket, TicketService};
    use crate::test_support::test_state;
    use ticketslave_core::{Priority, Role};

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
    async fn test_append_and_order() {
        let (state, alice, ticket_id, _tmp) = setup().await;
        let service = CommentService::new(&state);

        service.append(ticket_id, &alice, "checking now").await.unwrap();
        service.append(ticket_id, &alice, "found it").await.unwrap();

        let comments = service.list(ticket_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "checking now");
        assert!(comments[0].created_at <= comments[1].created_at);
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let (state, alice, ticket_id, _tmp) = setup().await;
        let service = CommentService::new(&state);

        assert!(matches!(
            service.append(ticket_id, &alice, "   ").await,
            Err(CommentError::EmptyBody)
        ));
    }

    #[tokio::test]
    async fn test_missing_ticket_rejected() {
        let (state, alice, _ticket_id, _tmp) = setup().await;
        let service = CommentService::new(&state);

        assert!(matches!(
            service.append(TicketId::new(999), &alice, "hello").await,
            Err(CommentError::TicketNotFound)
        ));
        assert!(matches!(
            service.list(TicketId::new(999)).await,
            Err(CommentError::TicketNotFound)
        ));
    }

    #[tokio::test]
    async fn test_body_is_trimmed() {
        let (state, alice, ticket_id, _tmp) = setup().await;
        let service = CommentService::new(&state);

        let comment = service
            .append(ticket_id, &alice, "  padded  ")
            .await
            .unwrap();
        assert_eq!(comment.body, "padded");
    }
}
