//! Ticket domain service.
//!
//! Owns the rules the repositories don't: who may change what, which
//! status transitions are legal, and what a delete must clean up.

use chrono::{DateTime, Utc};
use thiserror::Error;

use ticketslave_core::{Priority, QueueId, TicketId, TicketStatus, UserId};

use crate::db::{
    AttachmentRepository, CommentRepository, NewTicket, QueueRepository, RepositoryError,
    TicketChanges, TicketFilter, TicketRepository, UserRepository,
};
use crate::events::{EventSink, TicketEvent};
use crate::models::{CurrentUser, Ticket, TicketDetail};
use crate::state::AppState;
use crate::storage::AttachmentStore;

/// Upper bound on page size; larger requests are clamped.
pub const MAX_PER_PAGE: u32 = 100;

/// Errors that can occur during ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket does not exist.
    #[error("ticket not found")]
    TicketNotFound,

    /// Referenced queue does not exist.
    #[error("queue not found")]
    QueueNotFound,

    /// Referenced assignee does not exist.
    #[error("assignee not found")]
    AssigneeNotFound,

    /// The requested status change is outside the allowed edge set.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// The acting user may not perform this change.
    #[error("not permitted")]
    PermissionDenied,

    /// Bad input (empty title and the like).
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Fields accepted when creating a ticket.
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub queue_id: QueueId,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub assigned_to: Option<UserId>,
}

/// A partial update. `None` leaves the field untouched; the inner option on
/// `deadline` and `assigned_to` distinguishes "clear" from "keep".
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub queue_id: Option<QueueId>,
    pub priority: Option<Priority>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub assigned_to: Option<Option<UserId>>,
    pub status: Option<TicketStatus>,
}

/// A page of tickets plus the unpaged total.
#[derive(Debug)]
pub struct TicketPage {
    pub tickets: Vec<Ticket>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Ticket domain service.
pub struct TicketService<'a> {
    tickets: TicketRepository<'a>,
    queues: QueueRepository<'a>,
    users: UserRepository<'a>,
    comments: CommentRepository<'a>,
    attachments: AttachmentRepository<'a>,
    store: &'a AttachmentStore,
    events: &'a dyn EventSink,
    allow_reopen: bool,
}

impl<'a> TicketService<'a> {
    /// Create a new ticket service over the shared application state.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            tickets: TicketRepository::new(state.pool()),
            queues: QueueRepository::new(state.pool()),
            users: UserRepository::new(state.pool()),
            comments: CommentRepository::new(state.pool()),
            attachments: AttachmentRepository::new(state.pool()),
            store: state.attachments(),
            events: state.events(),
            allow_reopen: state.config().allow_reopen,
        }
    }

    /// Create a ticket in `open` status.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Validation` for an empty title,
    /// `TicketError::QueueNotFound` / `TicketError::AssigneeNotFound` for
    /// dangling references.
    pub async fn create(
        &self,
        actor: &CurrentUser,
        input: CreateTicket,
    ) -> Result<Ticket, TicketError> {
        let title = input.title.trim().to_owned();
        if title.is_empty() {
            return Err(TicketError::Validation("title is required".to_owned()));
        }

        if self.queues.get_by_id(input.queue_id).await?.is_none() {
            return Err(TicketError::QueueNotFound);
        }
        if let Some(assignee) = input.assigned_to
            && self.users.get_by_id(assignee).await?.is_none()
        {
            return Err(TicketError::AssigneeNotFound);
        }

        let ticket = self
            .tickets
            .create(&NewTicket {
                title,
                description: input.description,
                priority: input.priority,
                deadline: input.deadline,
                queue_id: input.queue_id,
                created_by: actor.id,
                assigned_to: input.assigned_to,
            })
            .await?;

        self.events.publish(&TicketEvent::Created {
            ticket_id: ticket.id,
            actor_id: actor.id,
        });
        if let Some(assignee_id) = ticket.assigned_to {
            self.events.publish(&TicketEvent::Assigned {
                ticket_id: ticket.id,
                actor_id: actor.id,
                assignee_id: Some(assignee_id),
            });
        }

        Ok(ticket)
    }

    /// Fetch a ticket with its comments and attachments.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::TicketNotFound` if the ticket doesn't exist.
    pub async fn get_detail(&self, id: TicketId) -> Result<TicketDetail, TicketError> {
        let ticket = self
            .tickets
            .get_by_id(id)
            .await?
            .ok_or(TicketError::TicketNotFound)?;
        let comments = self.comments.list_for_ticket(id).await?;
        let attachments = self.attachments.list_for_ticket(id).await?;

        Ok(TicketDetail {
            ticket,
            comments,
            attachments,
        })
    }

    /// List tickets matching a filter, newest first, paginated.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Repository` if the database operation fails.
    pub async fn list(
        &self,
        filter: TicketFilter,
        page: u32,
        per_page: u32,
    ) -> Result<TicketPage, TicketError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let total = self.tickets.count(filter).await?;
        let tickets = self
            .tickets
            .list(filter, i64::from(per_page), offset)
            .await?;

        Ok(TicketPage {
            tickets,
            total,
            page,
            per_page,
        })
    }

    /// Apply a partial update: field edits, assignment, and/or a status
    /// transition, each checked against its own permission rule.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::TicketNotFound` if the ticket doesn't exist,
    /// `TicketError::PermissionDenied` when the actor may not make a change,
    /// `TicketError::InvalidTransition` for a status change outside the
    /// allowed edge set.
    pub async fn update(
        &self,
        actor: &CurrentUser,
        id: TicketId,
        patch: TicketPatch,
    ) -> Result<Ticket, TicketError> {
        let current = self
            .tickets
            .get_by_id(id)
            .await?
            .ok_or(TicketError::TicketNotFound)?;

        let is_owner_or_admin = actor.role.is_admin() || current.created_by == actor.id;

        let edits_fields = patch.title.is_some()
            || patch.description.is_some()
            || patch.queue_id.is_some()
            || patch.priority.is_some()
            || patch.deadline.is_some();
        if edits_fields && !is_owner_or_admin {
            return Err(TicketError::PermissionDenied);
        }

        let title = match patch.title {
            Some(title) => {
                let title = title.trim().to_owned();
                if title.is_empty() {
                    return Err(TicketError::Validation("title cannot be empty".to_owned()));
                }
                title
            }
            None => current.title.clone(),
        };

        let queue_id = match patch.queue_id {
            Some(queue_id) => {
                if self.queues.get_by_id(queue_id).await?.is_none() {
                    return Err(TicketError::QueueNotFound);
                }
                queue_id
            }
            None => current.queue_id,
        };

        let assigned_to = match patch.assigned_to {
            Some(assigned_to) => {
                if !is_owner_or_admin {
                    return Err(TicketError::PermissionDenied);
                }
                if let Some(assignee) = assigned_to
                    && self.users.get_by_id(assignee).await?.is_none()
                {
                    return Err(TicketError::AssigneeNotFound);
                }
                assigned_to
            }
            None => current.assigned_to,
        };

        let status = match patch.status {
            Some(next) => {
                if !current.status.can_transition_to(next, self.allow_reopen) {
                    return Err(TicketError::InvalidTransition {
                        from: current.status,
                        to: next,
                    });
                }
                next
            }
            None => current.status,
        };

        let changes = TicketChanges {
            title,
            description: patch.description.unwrap_or_else(|| current.description.clone()),
            status,
            priority: patch.priority.unwrap_or(current.priority),
            deadline: patch.deadline.unwrap_or(current.deadline),
            queue_id,
            assigned_to,
        };
        let updated = self.tickets.update(id, &changes).await?;

        if updated.assigned_to != current.assigned_to {
            self.events.publish(&TicketEvent::Assigned {
                ticket_id: id,
                actor_id: actor.id,
                assignee_id: updated.assigned_to,
            });
        }
        if updated.status != current.status {
            self.events.publish(&TicketEvent::StatusChanged {
                ticket_id: id,
                actor_id: actor.id,
                from: current.status,
                to: updated.status,
            });
        }

        Ok(updated)
    }

    /// Delete a ticket along with its comments, attachment rows, and
    /// attachment files.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::TicketNotFound` if the ticket doesn't exist,
    /// `TicketError::PermissionDenied` when the actor is neither the
    /// creator nor an admin.
    pub async fn delete(&self, actor: &CurrentUser, id: TicketId) -> Result<(), TicketError> {
        let ticket = self
            .tickets
            .get_by_id(id)
            .await?
            .ok_or(TicketError::TicketNotFound)?;

        if !actor.role.is_admin() && ticket.created_by != actor.id {
            return Err(TicketError::PermissionDenied);
        }

        self.tickets.delete(id).await?;

        // Row deletion has committed; a failed file cleanup leaves orphaned
        // bytes but never dangling metadata.
        if let Err(e) = self.store.remove_ticket_files(id).await {
            tracing::warn!(ticket_id = %id, error = %e, "failed to remove attachment files");
        }

        self.events.publish(&TicketEvent::Deleted {
            ticket_id: id,
            actor_id: actor.id,
        });

        Ok(())
    }
}
