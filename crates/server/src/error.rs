//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers should return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AttachmentError, AuthError, CommentError, TicketError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Ticket domain operation failed.
    #[error("Ticket error: {0}")]
    Ticket(#[from] TicketError),

    /// Comment operation failed.
    #[error("Comment error: {0}")]
    Comment(#[from] CommentError),

    /// Attachment operation failed.
    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflicting state (duplicates, blocked deletions).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is a server fault worth tracking.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Database(repo)
            | Self::Auth(AuthError::Repository(repo))
            | Self::Ticket(TicketError::Repository(repo))
            | Self::Comment(CommentError::Repository(repo))
            | Self::Attachment(AttachmentError::Repository(repo)) => {
                matches!(
                    repo,
                    RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
                )
            }
            Self::Auth(AuthError::PasswordHash) | Self::Attachment(AttachmentError::Storage(_)) => {
                true
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(repo) => repository_status(repo),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::DuplicateUser => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidUsername(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::RegistrationDisabled => StatusCode::FORBIDDEN,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(repo) => repository_status(repo),
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Ticket(err) => match err {
                TicketError::TicketNotFound
                | TicketError::QueueNotFound
                | TicketError::AssigneeNotFound => StatusCode::NOT_FOUND,
                TicketError::InvalidTransition { .. } => StatusCode::CONFLICT,
                TicketError::PermissionDenied => StatusCode::FORBIDDEN,
                TicketError::Validation(_) => StatusCode::BAD_REQUEST,
                TicketError::Repository(repo) => repository_status(repo),
            },
            Self::Comment(err) => match err {
                CommentError::TicketNotFound => StatusCode::NOT_FOUND,
                CommentError::EmptyBody => StatusCode::BAD_REQUEST,
                CommentError::Repository(repo) => repository_status(repo),
            },
            Self::Attachment(err) => match err {
                AttachmentError::TicketNotFound | AttachmentError::NotFound => {
                    StatusCode::NOT_FOUND
                }
                AttachmentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                AttachmentError::ExtensionNotAllowed => StatusCode::BAD_REQUEST,
                AttachmentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AttachmentError::Repository(repo) => repository_status(repo),
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Server faults get a generic line; no SQL text
    /// or stack detail ever leaves the process.
    fn client_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Database(repo)
            | Self::Auth(AuthError::Repository(repo))
            | Self::Ticket(TicketError::Repository(repo))
            | Self::Comment(CommentError::Repository(repo))
            | Self::Attachment(AttachmentError::Repository(repo)) => match repo {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(AuthError::InvalidCredentials) => "Invalid username or password".to_string(),
            Self::Auth(AuthError::DuplicateUser) => {
                "An account with this username already exists".to_string()
            }
            Self::Auth(err) => err.to_string(),
            Self::Ticket(err) => err.to_string(),
            Self::Comment(err) => err.to_string(),
            Self::Attachment(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

const fn repository_status(repo: &RepositoryError) -> StatusCode {
    match repo {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.client_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
