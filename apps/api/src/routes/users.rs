//! User API handlers.
//!
//! Passwords are hashed with argon2 before they reach the repository; the
//! stored hash never leaves the service (listings use the public
//! projection, login returns only identity and role).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use stockroom_core::validation::{validate_name, validate_password};
use stockroom_core::{UserPublic, ValidationError, DEFAULT_USER_ROLE};
use stockroom_db::repository::user::UserChanges;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(delete_one))
        .route("/login", post(login))
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password for storage (argon2id, random salt).
fn hash_password(password: &str) -> Result<String, ApiError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Verifies a password against its stored hash.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// CRUD Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateUserBody {
    name: String,
    password: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateUserBody {
    name: Option<String>,
    role: Option<String>,
    password: Option<String>,
}

/// GET /api/users - list users, without credentials
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<UserPublic>>> {
    let users = state.db.users().list().await?;
    Ok(Json(users))
}

/// POST /api/users - create a user
async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBody>,
) -> ApiResult<(StatusCode, Json<UserPublic>)> {
    validate_name(&body.name)?;
    validate_password(&body.password)?;

    let hash = hash_password(&body.password)?;
    let role = body.role.as_deref().unwrap_or(DEFAULT_USER_ROLE);

    let user = state.db.users().create(&body.name, &hash, role).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id} - partial update; re-hashes when a password is given
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserBody>,
) -> ApiResult<StatusCode> {
    if let Some(name) = &body.name {
        validate_name(name)?;
    }

    let password_hash = match &body.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: body.name,
        role: body.role,
        password_hash,
    };
    if changes.is_empty() {
        return Err(ApiError::Validation(ValidationError::Required {
            field: "changes".to_string(),
        }));
    }

    state.db.users().update(id, &changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/users/{id} - delete a user (their movements keep a null actor)
async fn delete_one(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginBody {
    name: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    user_id: i64,
    name: String,
    role: String,
}

/// POST /api/users/login - verify credentials, return identity and role
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .find_by_name(&body.name)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown user or wrong password".to_string()))?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "unknown user or wrong password".to_string(),
        ));
    }

    Ok(Json(LoginResponse {
        user_id: user.id,
        name: user.name,
        role: user.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hashes_never_verify() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
        assert!(!verify_password("hunter2", ""));
    }
}
