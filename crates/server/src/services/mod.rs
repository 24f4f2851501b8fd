//! Domain services.
//!
//! Services own the business rules and sit between the HTTP routes and the
//! repositories. Each borrows the shared state for the duration of one
//! request.

pub mod attachments;
pub mod auth;
pub mod comments;
pub mod tickets;

pub use attachments::{AttachmentError, AttachmentService};
pub use auth::{AuthError, AuthService};
pub use comments::{CommentError, CommentService};
pub use tickets::{CreateTicket, TicketError, TicketPatch, TicketService};
