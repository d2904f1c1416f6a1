//! # Item Repository
//!
//! Read-side database operations for items.
//!
//! All item *writes* go through [`crate::ledger::StockLedger`] so the
//! quantity and the movement history stay paired; this repository only
//! answers queries.

use sqlx::PgPool;

use crate::error::DbResult;
use stockroom_core::Item;

/// Repository for item read operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: PgPool) -> Self {
        ItemRepository { pool }
    }

    /// Lists all items, newest first.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get(&self, id: i64) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }
}
