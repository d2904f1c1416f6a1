//! Item API handlers.
//!
//! POST and PUT accept either `multipart/form-data` (file field `image` plus
//! text fields) or `application/json` (where `image_url` may carry a data
//! URI or an external URL); [`ItemPayload`] hides the difference from the
//! handlers.
//!
//! All writes go through the stock ledger so the quantity and the movement
//! history stay paired.

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Request, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::routing::{get, post};
use axum::{extract::FromRequest, Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::stock::Direction;
use stockroom_core::validation::validate_item_fields;
use stockroom_core::{Item, ItemFields, UnitKind, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::media::{resolve_image, ImagePayload};
use crate::state::AppState;

/// Upload cap: a 7 MiB image plus multipart overhead.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
        .route("/{id}/consume", post(consume))
        .route("/{id}/restock", post(restock))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

// =============================================================================
// Payload
// =============================================================================

/// The writable fields as they arrive on the wire, JSON or multipart.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemBody {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit_kind: Option<String>,
    pub unit_price: Option<Decimal>,
    pub stock_min: Option<i64>,
    pub stock_max: Option<i64>,
    pub entered_at: Option<NaiveDate>,
    /// Data URI or external URL; multipart uploads use the `image` file
    /// field instead.
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub actor_id: Option<i64>,
}

/// Extractor that accepts both content types POST/PUT support.
pub struct ItemPayload {
    body: ItemBody,
    file: Option<Vec<u8>>,
}

impl<S> FromRequest<S> for ItemPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|err| {
                ApiError::Validation(ValidationError::InvalidFormat {
                    field: "body".to_string(),
                    reason: err.to_string(),
                })
            })?;
            Self::from_multipart(multipart).await
        } else {
            let json: Result<Json<ItemBody>, JsonRejection> =
                Json::from_request(req, state).await;
            let Json(body) = json.map_err(|rejection| {
                ApiError::Validation(ValidationError::InvalidFormat {
                    field: "body".to_string(),
                    reason: rejection.body_text(),
                })
            })?;
            Ok(ItemPayload { body, file: None })
        }
    }
}

impl ItemPayload {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut body = ItemBody::default();
        let mut file = None;

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "image" {
                file = Some(field.bytes().await?.to_vec());
            } else {
                let text = field.text().await?;
                body.set_text_field(&name, &text)?;
            }
        }

        Ok(ItemPayload { body, file })
    }

    /// Splits the payload into validated item fields, the image to resolve,
    /// and the acting user.
    fn into_parts(self) -> Result<(ItemFields, Option<ImagePayload>, Option<i64>), ApiError> {
        let ItemPayload { body, file } = self;

        let fields = ItemFields {
            code: body.code.unwrap_or_default(),
            name: body.name.unwrap_or_default(),
            description: body.description,
            quantity: body.quantity.unwrap_or(0),
            unit_kind: UnitKind::normalize(body.unit_kind.as_deref()),
            unit_price: body.unit_price.unwrap_or(Decimal::ZERO),
            stock_min: body.stock_min.unwrap_or(0),
            stock_max: body.stock_max.unwrap_or(0),
            entered_at: body.entered_at,
            // Filled in by the handler after media resolution.
            image_url: None,
            image_ref: None,
            category_id: body.category_id,
            supplier_id: body.supplier_id,
        };
        validate_item_fields(&fields)?;

        let image = match file {
            Some(bytes) => Some(ImagePayload::Bytes(bytes)),
            None => body.image_url.as_deref().and_then(ImagePayload::classify),
        };

        Ok((fields, image, body.actor_id))
    }
}

impl ItemBody {
    /// Applies one multipart text field. Blank values mean "absent", like a
    /// missing JSON key.
    fn set_text_field(&mut self, name: &str, value: &str) -> Result<(), ApiError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }

        match name {
            "code" => self.code = Some(value.to_string()),
            "name" => self.name = Some(value.to_string()),
            "description" => self.description = Some(value.to_string()),
            "unit_kind" => self.unit_kind = Some(value.to_string()),
            "image_url" => self.image_url = Some(value.to_string()),
            "quantity" => self.quantity = Some(parse_i64("quantity", value)?),
            "stock_min" => self.stock_min = Some(parse_i64("stock_min", value)?),
            "stock_max" => self.stock_max = Some(parse_i64("stock_max", value)?),
            "category_id" => self.category_id = Some(parse_i64("category_id", value)?),
            "supplier_id" => self.supplier_id = Some(parse_i64("supplier_id", value)?),
            "actor_id" => self.actor_id = Some(parse_i64("actor_id", value)?),
            "unit_price" => {
                self.unit_price = Some(value.parse::<Decimal>().map_err(|_| {
                    invalid_format("unit_price", "expected a decimal number")
                })?)
            }
            "entered_at" => {
                self.entered_at = Some(
                    NaiveDate::parse_from_str(value, "%Y-%m-%d")
                        .map_err(|_| invalid_format("entered_at", "expected YYYY-MM-DD"))?,
                )
            }
            // Unknown fields are ignored, like unknown JSON keys.
            _ => {}
        }
        Ok(())
    }
}

fn parse_i64(field: &str, value: &str) -> Result<i64, ApiError> {
    value
        .parse::<i64>()
        .map_err(|_| invalid_format(field, "expected an integer"))
}

fn invalid_format(field: &str, reason: &str) -> ApiError {
    ApiError::Validation(ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

// =============================================================================
// CRUD Handlers
// =============================================================================

/// GET /api/items - list all items, newest first
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Item>>> {
    let items = state.db.items().list().await?;
    Ok(Json(items))
}

/// GET /api/items/{id} - fetch one item
async fn get_one(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Item>> {
    let item = state
        .db
        .items()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;
    Ok(Json(item))
}

/// POST /api/items - create an item, optionally with initial stock and image
async fn create(
    State(state): State<AppState>,
    payload: ItemPayload,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let (mut fields, image, actor_id) = payload.into_parts()?;

    // Image first: an upload failure must abort before any database write.
    let resolved = resolve_image(&state.media, image, None, None).await?;
    fields.image_url = resolved.url.clone();
    fields.image_ref = resolved.asset_id.clone();

    match state
        .db
        .ledger()
        .create_with_initial_stock(&fields, actor_id)
        .await
    {
        Ok(item) => Ok((StatusCode::CREATED, Json(item))),
        Err(err) => {
            // The blob went up but the row never landed; drop the orphan.
            if resolved.uploaded {
                if let Some(asset_id) = &resolved.asset_id {
                    state.media.delete_best_effort(asset_id).await;
                }
            }
            Err(err.into())
        }
    }
}

/// PUT /api/items/{id} - overwrite an item's fields (may replace the image)
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: ItemPayload,
) -> ApiResult<Json<Item>> {
    let (mut fields, image, actor_id) = payload.into_parts()?;

    let current = state
        .db
        .items()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;

    let resolved = resolve_image(
        &state.media,
        image,
        current.image_url.as_deref(),
        current.image_ref.as_deref(),
    )
    .await?;
    fields.image_url = resolved.url.clone();
    fields.image_ref = resolved.asset_id.clone();

    match state.db.ledger().record_edit(id, &fields, actor_id).await {
        Ok(item) => Ok(Json(item)),
        Err(err) => {
            if resolved.uploaded {
                if let Some(asset_id) = &resolved.asset_id {
                    state.media.delete_best_effort(asset_id).await;
                }
            }
            Err(err.into())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeleteRequest {
    actor_id: Option<i64>,
}

/// DELETE /api/items/{id} - delete an item, leaving a tombstone movement
async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    // The body is optional; anything unparseable counts as absent.
    let actor_id = body.ok().and_then(|Json(req)| req.actor_id);

    let deleted = state.db.ledger().delete_with_snapshot(id, actor_id).await?;

    // Blob cleanup happens after the commit and never fails the request.
    if let Some(asset_id) = &deleted.image_ref {
        state.media.delete_best_effort(asset_id).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Stock Delta Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DeltaRequest {
    pub quantity: i64,
    #[serde(default)]
    pub actor_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeltaResponse {
    pub new_quantity: i64,
    pub movement_id: i64,
}

/// POST /api/items/{id}/consume - outbound stock delta
async fn consume(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<DeltaRequest>,
) -> ApiResult<Json<DeltaResponse>> {
    apply_delta(&state, id, req, Direction::Outbound).await
}

/// POST /api/items/{id}/restock - inbound stock delta
async fn restock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<DeltaRequest>,
) -> ApiResult<Json<DeltaResponse>> {
    apply_delta(&state, id, req, Direction::Inbound).await
}

async fn apply_delta(
    state: &AppState,
    id: i64,
    req: DeltaRequest,
    direction: Direction,
) -> ApiResult<Json<DeltaResponse>> {
    let outcome = state
        .db
        .ledger()
        .apply_delta(id, req.quantity, direction, req.actor_id)
        .await?;

    Ok(Json(DeltaResponse {
        new_quantity: outcome.new_quantity,
        movement_id: outcome.movement_id,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_text_fields_parse_into_body() {
        let mut body = ItemBody::default();
        body.set_text_field("code", "TORN-M8").unwrap();
        body.set_text_field("quantity", "12").unwrap();
        body.set_text_field("unit_price", "3.75").unwrap();
        body.set_text_field("entered_at", "2026-08-01").unwrap();
        body.set_text_field("somebody_elses_field", "ignored").unwrap();

        assert_eq!(body.code.as_deref(), Some("TORN-M8"));
        assert_eq!(body.quantity, Some(12));
        assert_eq!(body.unit_price, Some(Decimal::new(375, 2)));
        assert_eq!(
            body.entered_at,
            NaiveDate::from_ymd_opt(2026, 8, 1)
        );
    }

    #[test]
    fn blank_multipart_fields_are_absent() {
        let mut body = ItemBody::default();
        body.set_text_field("quantity", "   ").unwrap();
        assert!(body.quantity.is_none());
    }

    #[test]
    fn bad_numbers_name_the_field() {
        let mut body = ItemBody::default();
        let err = body.set_text_field("stock_min", "lots").unwrap_err();
        match err {
            ApiError::Validation(v) => assert_eq!(v.field(), "stock_min"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn payload_requires_code_and_name() {
        let payload = ItemPayload {
            body: ItemBody {
                name: Some("Nameless".to_string()),
                ..Default::default()
            },
            file: None,
        };
        let err = payload.into_parts().unwrap_err();
        match err {
            ApiError::Validation(v) => assert_eq!(v.field(), "code"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn json_image_url_is_classified() {
        let payload = ItemPayload {
            body: ItemBody {
                code: Some("X-1".to_string()),
                name: Some("X".to_string()),
                image_url: Some("https://cdn.example.com/x.png".to_string()),
                ..Default::default()
            },
            file: None,
        };
        let (fields, image, _) = payload.into_parts().unwrap();
        assert!(fields.image_url.is_none());
        assert!(matches!(image, Some(ImagePayload::ExternalUrl(_))));
    }

    #[test]
    fn file_bytes_win_over_image_url() {
        let payload = ItemPayload {
            body: ItemBody {
                code: Some("X-1".to_string()),
                name: Some("X".to_string()),
                image_url: Some("https://cdn.example.com/x.png".to_string()),
                ..Default::default()
            },
            file: Some(vec![0xFF, 0xD8]),
        };
        let (_, image, _) = payload.into_parts().unwrap();
        assert!(matches!(image, Some(ImagePayload::Bytes(_))));
    }
}
