//! Queue route handlers.
//!
//! Every user can list queues (ticket forms need them); creating, editing,
//! and deleting queues is admin-only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use ticketslave_core::QueueId;

use crate::db::QueueRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Queue;
use crate::state::AppState;

/// Queue create/update request body.
#[derive(Debug, Deserialize)]
pub struct QueueBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// List all queues.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<Queue>>> {
    let queues = QueueRepository::new(state.pool()).list_all().await?;
    Ok(Json(queues))
}

/// Create a queue (admin).
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<QueueBody>,
) -> Result<impl IntoResponse> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("queue name cannot be empty".to_owned()));
    }

    let queue = QueueRepository::new(state.pool())
        .create(name, body.description.trim())
        .await?;

    tracing::info!(queue_id = %queue.id, admin_id = %admin.id, name = %queue.name, "queue created");
    Ok((StatusCode::CREATED, Json(queue)))
}

/// Rename or re-describe a queue (admin).
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<QueueId>,
    Json(body): Json<QueueBody>,
) -> Result<Json<Queue>> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("queue name cannot be empty".to_owned()));
    }

    let queue = QueueRepository::new(state.pool())
        .update(id, name, body.description.trim())
        .await?;
    Ok(Json(queue))
}

/// Delete a queue (admin). Refused while tickets remain in it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<QueueId>,
) -> Result<StatusCode> {
    let repo = QueueRepository::new(state.pool());

    if repo.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("queue not found".to_owned()));
    }

    let tickets = repo.ticket_count(id).await?;
    if tickets > 0 {
        return Err(AppError::Conflict(format!(
            "queue still contains {tickets} tickets"
        )));
    }

    repo.delete(id).await?;
    tracing::info!(queue_id = %id, admin_id = %admin.id, "queue deleted");
    Ok(StatusCode::NO_CONTENT)
}
