//! Authentication route handlers.
//!
//! Registration, login, logout, and password changes. Login stores a
//! [`CurrentUser`] in the server-side session; everything else in the app
//! reads it back through the auth extractors.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Body Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse> {
    let user: User = AuthService::new(state.pool())
        .register(&body.username, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "new user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and establish a session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&body.username, &body.password)
        .await
        .inspect_err(|_| {
            tracing::warn!(username = %body.username, "failed login attempt");
        })?;

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(user))
}

/// Log out and invalidate the session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return the current session identity.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}

/// Change the current user's password.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ChangePasswordBody>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(&user.username, &body.current_password, &body.new_password)
        .await?;

    tracing::info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
