//! # User Repository
//!
//! User accounts: listing (credential never leaves the database layer except
//! through `find_by_name` for login verification), creation with a
//! pre-hashed credential, partial updates, deletion.

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{User, UserPublic};

/// A partial update of a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<String>,
    /// Already hashed; this repository never sees plaintext passwords.
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// True when there is nothing to update.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.password_hash.is_none()
    }
}

/// Repository for user operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: PgPool) -> Self {
        UserRepository { pool }
    }

    /// Lists all users, newest first, without credentials.
    pub async fn list(&self) -> DbResult<Vec<UserPublic>> {
        let users =
            sqlx::query_as::<_, UserPublic>("SELECT id, name, role FROM users ORDER BY id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    /// Looks a user up by name, including the stored credential.
    /// Used by login verification only.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, password_hash, role FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Inserts a new user. The name is unique; a duplicate surfaces as
    /// `DbError::UniqueViolation`.
    pub async fn create(&self, name: &str, password_hash: &str, role: &str) -> DbResult<UserPublic> {
        debug!(name, role, "Creating user");

        let user = sqlx::query_as::<_, UserPublic>(
            r#"
            INSERT INTO users (name, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, name, role
            "#,
        )
        .bind(name.trim())
        .bind(password_hash)
        .bind(role.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Applies a partial update. Callers must reject empty change sets
    /// before reaching here (`UserChanges::is_empty`).
    pub async fn update(&self, id: i64, changes: &UserChanges) -> DbResult<()> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut fields = qb.separated(", ");

        if let Some(name) = &changes.name {
            fields.push("name = ").push_bind_unseparated(name.trim());
        }
        if let Some(role) = &changes.role {
            fields.push("role = ").push_bind_unseparated(role.trim());
        }
        if let Some(hash) = &changes.password_hash {
            fields.push("password_hash = ").push_bind_unseparated(hash);
        }

        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    /// Deletes a user. Their movements survive with a nulled actor
    /// reference.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }
}
