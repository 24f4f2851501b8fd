//! Application settings route handlers (admin-only).

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// The application toggles exposed to administrators.
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsBody {
    pub allow_registration: bool,
}

/// Read the current settings.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<SettingsBody>> {
    let allow_registration = SettingsRepository::new(state.pool())
        .allow_registration()
        .await?;
    Ok(Json(SettingsBody { allow_registration }))
}

/// Update the settings.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<SettingsBody>,
) -> Result<Json<SettingsBody>> {
    SettingsRepository::new(state.pool())
        .set_allow_registration(body.allow_registration)
        .await?;

    tracing::info!(
        admin_id = %admin.id,
        allow_registration = body.allow_registration,
        "settings updated"
    );
    Ok(Json(body))
}
