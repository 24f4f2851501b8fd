//! Ticket, queue, comment, and attachment domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ticketslave_core::{
    AttachmentId, CommentId, Priority, QueueId, TicketId, TicketStatus, UserId, Username,
};

/// A named grouping of tickets.
#[derive(Debug, Clone, Serialize)]
pub struct Queue {
    pub id: QueueId,
    pub name: String,
    pub description: String,
}

/// A ticket with its queue and user names resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    /// Optional due date.
    pub deadline: Option<DateTime<Utc>>,
    pub queue_id: QueueId,
    pub queue_name: String,
    pub created_by: UserId,
    pub creator_username: Username,
    pub assigned_to: Option<UserId>,
    pub assignee_username: Option<Username>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single ticket comment. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub author_username: Username,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a file attached to a ticket.
///
/// The stored filename is a server-side storage detail and is not exposed
/// in responses; downloads go through the attachment id.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub ticket_id: TicketId,
    pub uploader_id: UserId,
    pub original_filename: String,
    #[serde(skip_serializing)]
    pub stored_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// A ticket together with its comments and attachments, as returned by the
/// detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}
