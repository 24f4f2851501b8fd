//! User management route handlers.
//!
//! Listing is open to any authenticated user (assignee pickers need it);
//! role changes and deletion are admin-only. Deletion is refused while the
//! user is still referenced by tickets, comments, or attachments so no
//! authorship information is ever silently orphaned.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use ticketslave_core::{Role, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::state::AppState;

/// Role change request body.
#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

/// List all users, ordered by username.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}

/// Change a user's role (admin).
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<RoleBody>,
) -> Result<Json<User>> {
    if id == admin.id && body.role != Role::Admin {
        return Err(AppError::Conflict(
            "cannot remove your own administrator role".to_owned(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .update_role(id, body.role)
        .await?;

    tracing::info!(user_id = %id, admin_id = %admin.id, role = %body.role, "user role changed");
    Ok(Json(user))
}

/// Delete a user (admin). Refused while references remain.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(AppError::Conflict("cannot delete your own account".to_owned()));
    }

    let repo = UserRepository::new(state.pool());

    if repo.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("user not found".to_owned()));
    }

    let references = repo.reference_count(id).await?;
    if references > 0 {
        return Err(AppError::Conflict(format!(
            "user is still referenced by {references} tickets, comments, or attachments"
        )));
    }

    repo.delete(id).await?;
    tracing::info!(user_id = %id, admin_id = %admin.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
