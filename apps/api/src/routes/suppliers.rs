//! Supplier API handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use stockroom_core::validation::validate_name;
use stockroom_core::Supplier;
use stockroom_db::repository::supplier::SupplierFields;
use stockroom_db::DbError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(delete_one))
}

#[derive(Debug, Deserialize)]
struct SupplierBody {
    name: String,
    #[serde(default)]
    tax_id: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    contact: Option<String>,
}

impl SupplierBody {
    fn into_fields(self) -> Result<SupplierFields, ApiError> {
        validate_name(&self.name)?;
        Ok(SupplierFields {
            name: self.name,
            tax_id: self.tax_id,
            phone: self.phone,
            email: self.email,
            address: self.address,
            contact: self.contact,
        })
    }
}

/// GET /api/suppliers - list all suppliers
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    let suppliers = state.db.suppliers().list().await?;
    Ok(Json(suppliers))
}

/// POST /api/suppliers - create a supplier
async fn create(
    State(state): State<AppState>,
    Json(body): Json<SupplierBody>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let fields = body.into_fields()?;
    let supplier = state.db.suppliers().create(&fields).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// PUT /api/suppliers/{id} - update a supplier
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SupplierBody>,
) -> ApiResult<StatusCode> {
    let fields = body.into_fields()?;
    state.db.suppliers().update(id, &fields).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/suppliers/{id} - delete, 409 while referenced by items
async fn delete_one(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.suppliers().delete(id).await.map_err(|err| match err {
        DbError::ForeignKeyViolation { .. } => {
            ApiError::Conflict("supplier is still referenced by items".to_string())
        }
        other => other.into(),
    })?;
    Ok(StatusCode::NO_CONTENT)
}
