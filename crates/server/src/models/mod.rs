//! Domain models for the ticket tracker.
//!
//! These types represent validated domain objects separate from database
//! row types. They serialize directly as API response bodies; nothing here
//! carries secrets (password hashes stay inside the user repository).

pub mod session;
pub mod ticket;
pub mod user;

pub use session::{CurrentUser, session_keys};
pub use ticket::{Attachment, Comment, Queue, Ticket, TicketDetail};
pub use user::User;
