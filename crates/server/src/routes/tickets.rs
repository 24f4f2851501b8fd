//! Ticket route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use ticketslave_core::{Priority, QueueId, TicketId, TicketStatus, UserId};

use crate::db::TicketFilter;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Ticket;
use crate::services::tickets::{CreateTicket, TicketPatch, TicketService};
use crate::state::AppState;

/// Default page size for ticket listings.
const DEFAULT_PER_PAGE: u32 = 15;

// =============================================================================
// Body & Query Types
// =============================================================================

/// Query parameters for ticket listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub queue_id: Option<QueueId>,
    pub status: Option<TicketStatus>,
    pub assignee_id: Option<UserId>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Ticket creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub queue_id: QueueId,
    #[serde(default)]
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub assignee_id: Option<UserId>,
}

/// Ticket update request body.
///
/// Absent fields stay untouched. `deadline` and `assignee_id` use
/// double-option semantics: sending `null` clears the value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub queue_id: Option<QueueId>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<UserId>>,
    pub status: Option<TicketStatus>,
}

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A page of tickets.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub tickets: Vec<Ticket>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// List tickets with optional filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let filter = TicketFilter {
        queue_id: query.queue_id,
        status: query.status,
        assigned_to: query.assignee_id,
    };

    let page = TicketService::new(&state)
        .list(
            filter,
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
        .await?;

    Ok(Json(ListResponse {
        tickets: page.tickets,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Create a new ticket in `open` status.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse> {
    let ticket = TicketService::new(&state)
        .create(
            &user,
            CreateTicket {
                title: body.title,
                description: body.description,
                queue_id: body.queue_id,
                priority: body.priority,
                deadline: body.deadline,
                assigned_to: body.assignee_id,
            },
        )
        .await?;

    tracing::info!(ticket_id = %ticket.id, user_id = %user.id, "ticket created");
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Fetch a ticket with its comments and attachments.
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<TicketId>,
) -> Result<impl IntoResponse> {
    let detail = TicketService::new(&state).get_detail(id).await?;
    Ok(Json(detail))
}

/// Update ticket fields, assignment, and/or status.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TicketId>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Ticket>> {
    let ticket = TicketService::new(&state)
        .update(
            &user,
            id,
            TicketPatch {
                title: body.title,
                description: body.description,
                queue_id: body.queue_id,
                priority: body.priority,
                deadline: body.deadline,
                assigned_to: body.assignee_id,
                status: body.status,
            },
        )
        .await?;

    Ok(Json(ticket))
}

/// Delete a ticket and everything attached to it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TicketId>,
) -> Result<StatusCode> {
    TicketService::new(&state).delete(&user, id).await?;
    tracing::info!(ticket_id = %id, user_id = %user.id, "ticket deleted");
    Ok(StatusCode::NO_CONTENT)
}
