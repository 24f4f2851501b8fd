//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (verifies database)
//!
//! # Auth
//! POST /register                - Create an account
//! POST /login                   - Log in, establishes the session
//! POST /logout                  - Log out, invalidates the session
//! GET  /me                      - Current session identity
//! POST /me/password             - Change own password
//!
//! # Tickets
//! GET    /tickets               - List (filter by queue/status/assignee, paginated)
//! POST   /tickets               - Create
//! GET    /tickets/{id}          - Detail with comments and attachments
//! PATCH  /tickets/{id}          - Update fields / assign / transition status
//! DELETE /tickets/{id}          - Delete with cascade (rows and files)
//!
//! # Comments
//! GET  /tickets/{id}/comments   - List in creation order
//! POST /tickets/{id}/comments   - Append
//!
//! # Attachments
//! POST /tickets/{id}/attachments - Upload (multipart field "file")
//! GET  /attachments/{id}         - Download with original filename
//!
//! # Queues (listing for all users, management admin-only)
//! GET    /queues                - List
//! POST   /queues                - Create (admin)
//! PATCH  /queues/{id}           - Update (admin)
//! DELETE /queues/{id}           - Delete while empty (admin)
//!
//! # Users
//! GET    /users                 - List (for assignee pickers)
//! PATCH  /users/{id}            - Change role (admin)
//! DELETE /users/{id}            - Delete while unreferenced (admin)
//!
//! # Settings (admin)
//! GET /settings                 - Read application toggles
//! PUT /settings                 - Update application toggles
//! ```

pub mod attachments;
pub mod auth;
pub mod comments;
pub mod queues;
pub mod settings;
pub mod tickets;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/me/password", post(auth::change_password))
}

/// Create the ticket routes router (tickets, comments, uploads).
pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tickets::list).post(tickets::create))
        .route(
            "/{id}",
            get(tickets::detail)
                .patch(tickets::update)
                .delete(tickets::delete),
        )
        .route(
            "/{id}/comments",
            get(comments::list).post(comments::create),
        )
        .route("/{id}/attachments", post(attachments::upload))
}

/// Create the queue routes router.
pub fn queue_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(queues::list).post(queues::create))
        .route("/{id}", axum::routing::patch(queues::update).delete(queues::delete))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route(
            "/{id}",
            axum::routing::patch(users::update_role).delete(users::delete),
        )
}

/// Create all application routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .nest("/tickets", ticket_routes())
        .route("/attachments/{id}", get(attachments::download))
        .nest("/queues", queue_routes())
        .nest("/users", user_routes())
        .route(
            "/settings",
            get(settings::show).put(settings::update),
        )
}
