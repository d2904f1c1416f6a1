//! Movement API handlers.
//!
//! The listing joins item and user names, falling back to the deletion-time
//! snapshot when the item is gone. POST/PUT/DELETE here are administrative
//! bookkeeping: they write movement rows directly and never touch item
//! quantities - stock changes go through `/api/items/{id}/consume` and
//! `/restock`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockroom_core::{Movement, MovementKind, ValidationError};
use stockroom_db::repository::movement::{MovementChanges, MovementRecord, NewMovement};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(delete_one))
}

fn parse_kind(value: &str) -> Result<MovementKind, ApiError> {
    MovementKind::from_wire(value).ok_or_else(|| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "kind".to_string(),
            reason: "expected one of inbound, outbound, edited, deleted".to_string(),
        })
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/movements - full history, newest first
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<MovementRecord>>> {
    let movements = state.db.movements().list().await?;
    Ok(Json(movements))
}

#[derive(Debug, Deserialize)]
struct CreateMovementBody {
    #[serde(default)]
    item_id: Option<i64>,
    kind: String,
    quantity: i64,
    actor_id: i64,
    #[serde(default)]
    occurred_at: Option<DateTime<Utc>>,
}

/// POST /api/movements - record a manual movement entry
async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateMovementBody>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    let kind = parse_kind(&body.kind)?;

    // Quantity-bearing kinds must carry a positive magnitude; edited and
    // deleted entries are informational and may be zero.
    if kind.is_delta() && body.quantity <= 0 {
        return Err(ApiError::Validation(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }));
    }

    let movement = state
        .db
        .movements()
        .insert(&NewMovement {
            item_id: body.item_id,
            kind,
            quantity: body.quantity,
            actor_id: Some(body.actor_id),
            occurred_at: body.occurred_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateMovementBody {
    item_id: Option<i64>,
    kind: Option<String>,
    quantity: Option<i64>,
    actor_id: Option<i64>,
    occurred_at: Option<DateTime<Utc>>,
}

/// PUT /api/movements/{id} - correct a movement entry
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateMovementBody>,
) -> ApiResult<StatusCode> {
    let kind = match &body.kind {
        Some(raw) => Some(parse_kind(raw)?),
        None => None,
    };

    let changes = MovementChanges {
        item_id: body.item_id,
        kind,
        quantity: body.quantity,
        actor_id: body.actor_id,
        occurred_at: body.occurred_at,
    };
    if changes.is_empty() {
        return Err(ApiError::Validation(ValidationError::Required {
            field: "changes".to_string(),
        }));
    }

    state.db.movements().update(id, &changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/movements/{id} - remove a movement entry
async fn delete_one(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.movements().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
