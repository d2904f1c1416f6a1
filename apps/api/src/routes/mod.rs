//! API route modules.
//!
//! One module per resource, each exporting a `router()` nested under
//! `/api/<resource>`:
//!
//! - [`items`] - CRUD, image attachments, consume/restock ledger ops
//! - [`categories`] - CRUD, delete blocked while referenced
//! - [`suppliers`] - CRUD, delete blocked while referenced
//! - [`users`] - CRUD plus login
//! - [`movements`] - joined listing and administrative entries
//! - [`reports`] - aggregates and CSV export

pub mod categories;
pub mod items;
pub mod movements;
pub mod reports;
pub mod suppliers;
pub mod users;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/items", items::router())
        .nest("/api/categories", categories::router())
        .nest("/api/suppliers", suppliers::router())
        .nest("/api/users", users::router())
        .nest("/api/movements", movements::router())
        .nest("/api/reports", reports::router())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    database: bool,
}

/// GET /health - liveness plus a database round-trip
async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        database: state.db.health_check().await,
    })
}
