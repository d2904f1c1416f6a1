//! Unified error handling for the API surface.
//!
//! Every failure a handler can produce collapses into [`ApiError`], which
//! serializes as a structured body:
//!
//! ```json
//! { "error": "insufficient_stock", "message": "insufficient stock: ...", "field": null }
//! ```
//!
//! `error` is the machine-readable kind; `field` is present for validation
//! failures so clients can highlight the offending input.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use stockroom_core::{CoreError, ValidationError};
use stockroom_db::{DbError, LedgerError};

use crate::media::MediaError;

/// Structured error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller-fixable input problem; names the offending field.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unique-constraint or FK-restrict violation.
    #[error("{0}")]
    Conflict(String),

    /// An outbound delta would drive the quantity negative.
    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// Bad credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The media host rejected or never received the blob.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The store is unreachable or timed out. Retryable by the caller.
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// Anything else. The message is logged, not leaked.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::InsufficientStock { .. } => (StatusCode::CONFLICT, "insufficient_stock"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Upload(_) => (StatusCode::BAD_GATEWAY, "upload"),
            ApiError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let field = match &self {
            ApiError::Validation(err) => Some(err.field().to_string()),
            _ => None,
        };

        // Internals get logged with detail and answered generically; the
        // process never crashes on a handler failure.
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(%detail, "Internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            error: kind,
            message,
            field,
        });

        (status, body).into_response()
    }
}

// ========== Conversions from lower layers ==========

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::CheckViolation { .. } => ApiError::Conflict(err.to_string()),
            DbError::PoolExhausted | DbError::ConnectionFailed(_) => {
                ApiError::Storage(err.to_string())
            }
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ItemNotFound { id } => ApiError::NotFound(format!("item {id} not found")),
            LedgerError::Domain(core) => core.into(),
            LedgerError::Storage(db) => db.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
            } => ApiError::InsufficientStock {
                available,
                requested,
            },
            CoreError::Validation(v) => ApiError::Validation(v),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidDataUri(reason) => ApiError::Validation(
                ValidationError::InvalidFormat {
                    field: "image_url".to_string(),
                    reason,
                },
            ),
            other => ApiError::Upload(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "body".to_string(),
            reason: format!("multipart error: {err}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn statuses_match_kinds() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ApiError::Validation(ValidationError::Required {
                    field: "code".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::NotFound("item 1 not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("duplicate".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::InsufficientStock {
                    available: 1,
                    requested: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Unauthorized("bad password".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Upload("down".to_string()), StatusCode::BAD_GATEWAY),
            (
                ApiError::Storage("timeout".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Internal("oops".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: ApiError = DbError::UniqueViolation {
            constraint: "items_code_key".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn ledger_insufficient_stock_is_preserved() {
        let err: ApiError = LedgerError::Domain(CoreError::InsufficientStock {
            available: 3,
            requested: 9,
        })
        .into();
        match err {
            ApiError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 9);
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn pool_exhaustion_is_retryable_storage() {
        let err: ApiError = DbError::PoolExhausted.into();
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
