//! Category API handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use stockroom_core::validation::validate_name;
use stockroom_core::Category;
use stockroom_db::DbError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(delete_one))
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    name: String,
}

/// GET /api/categories - list all categories
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state.db.categories().list().await?;
    Ok(Json(categories))
}

/// POST /api/categories - create a category
async fn create(
    State(state): State<AppState>,
    Json(body): Json<CategoryBody>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    validate_name(&body.name)?;
    let category = state.db.categories().create(&body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id} - rename a category
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryBody>,
) -> ApiResult<StatusCode> {
    validate_name(&body.name)?;
    state.db.categories().update(id, &body.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/categories/{id} - delete, 409 while referenced by items
async fn delete_one(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.categories().delete(id).await.map_err(|err| match err {
        DbError::ForeignKeyViolation { .. } => {
            ApiError::Conflict("category is still referenced by items".to_string())
        }
        other => other.into(),
    })?;
    Ok(StatusCode::NO_CONTENT)
}
