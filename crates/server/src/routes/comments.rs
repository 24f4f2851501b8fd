//! Comment route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use ticketslave_core::TicketId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Comment;
use crate::services::CommentService;
use crate::state::AppState;

/// Comment creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub body: String,
}

/// List a ticket's comments, oldest first.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(ticket_id): Path<TicketId>,
) -> Result<Json<Vec<Comment>>> {
    let comments = CommentService::new(&state).list(ticket_id).await?;
    Ok(Json(comments))
}

/// Append a comment to a ticket.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(ticket_id): Path<TicketId>,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse> {
    let comment = CommentService::new(&state)
        .append(ticket_id, &user, &body.body)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}
