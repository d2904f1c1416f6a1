//! # Category Repository
//!
//! CRUD for categories. Deletion is blocked by the `ON DELETE RESTRICT`
//! foreign key while items still reference the category; that surfaces as
//! `DbError::ForeignKeyViolation` and becomes a 409 at the API layer.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::Category;

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: PgPool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    /// Inserts a new category.
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        debug!(name, "Creating category");

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    /// Renames a category.
    pub async fn update(&self, id: i64, name: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }

    /// Deletes a category. Fails with a foreign key violation while items
    /// reference it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}
