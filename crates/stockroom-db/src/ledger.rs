//! # Stock Ledger
//!
//! Keeps `items.quantity` and the `movements` audit trail consistent under
//! concurrent requests.
//!
//! ## The Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Lost Update Without Row Locking                         │
//! │                                                                         │
//! │  Request A: read quantity = 10          Request B: read quantity = 10  │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  write 10 - 7 = 3                       write 10 - 8 = 2               │
//! │                                                                         │
//! │  Final quantity: 2 (B overwrote A) — 15 units left the building        │
//! │  against a shelf that held 10.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Fix
//! Every quantity-affecting operation opens a transaction and reads the item
//! row with `SELECT ... FOR UPDATE`. A second transaction touching the same
//! item blocks on that lock until the first commits or rolls back, so
//! read-compute-write sequences on one item serialize. Operations on
//! different items proceed independently.
//!
//! The locking syntax is confined to [`fetch_quantity_for_update`]; the rest
//! of the ledger works against what it returns. The arithmetic itself
//! (add/subtract, never below zero) is `stockroom_core::stock::next_quantity`.
//!
//! Cancellation: a dropped request future drops the `Transaction`, which
//! rolls back. Nothing partial ever becomes visible.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::stock::{next_quantity, Direction};
use stockroom_core::{CoreError, Item, ItemFields, MovementKind};

// =============================================================================
// Errors
// =============================================================================

/// Failures of a ledger operation.
///
/// Every failure path rolls back the enclosing transaction before surfacing:
/// a half-applied quantity/movement pair is never observable.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The referenced item does not exist (no row locked).
    #[error("item not found: {id}")]
    ItemNotFound { id: i64 },

    /// A business rule rejected the operation (insufficient stock, bad
    /// magnitude). No rows were mutated.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The store failed (connection, timeout, constraint). The transaction
    /// was rolled back or never committed.
    #[error(transparent)]
    Storage(#[from] DbError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of applying a stock delta.
#[derive(Debug, Clone, Copy)]
pub struct DeltaOutcome {
    /// The item's quantity after the delta.
    pub new_quantity: i64,
    /// Identifier of the movement row recorded for the delta.
    pub movement_id: i64,
}

/// What `delete_with_snapshot` removed.
///
/// Carries the media reference so the caller can clean up the blob *after*
/// the database commit; blob cleanup is best-effort and never part of the
/// transaction.
#[derive(Debug, Clone)]
pub struct DeletedItem {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub image_ref: Option<String>,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// The stock ledger: all writes that must keep the item quantity and the
/// movement history in lockstep go through here.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: PgPool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: PgPool) -> Self {
        StockLedger { pool }
    }

    /// Atomically applies a signed stock delta and records the movement.
    ///
    /// ## Protocol
    /// 1. Begin transaction
    /// 2. `SELECT quantity ... FOR UPDATE` - absent row → `ItemNotFound`
    /// 3. Compute the new quantity - outbound underflow → `InsufficientStock`
    /// 4. Write the new quantity, insert the movement row
    /// 5. Commit
    ///
    /// Steps 2-4 hold the row lock, so concurrent deltas against the same
    /// item serialize and the quantity can never be driven negative by a
    /// race.
    pub async fn apply_delta(
        &self,
        item_id: i64,
        magnitude: i64,
        direction: Direction,
        actor_id: Option<i64>,
    ) -> LedgerResult<DeltaOutcome> {
        debug!(item_id, magnitude, ?direction, "Applying stock delta");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let Some(current) = fetch_quantity_for_update(&mut tx, item_id).await? else {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(LedgerError::ItemNotFound { id: item_id });
        };

        let new_quantity = match next_quantity(current, magnitude, direction) {
            Ok(q) => q,
            Err(err) => {
                // No rows mutated yet; release the lock and surface the
                // domain failure untouched.
                tx.rollback().await.map_err(DbError::from)?;
                return Err(err.into());
            }
        };

        sqlx::query("UPDATE items SET quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(item_id)
            .bind(new_quantity)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let movement_id = insert_movement(
            &mut tx,
            Some(item_id),
            direction.movement_kind(),
            magnitude,
            actor_id,
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;

        debug!(item_id, new_quantity, movement_id, "Stock delta committed");
        Ok(DeltaOutcome {
            new_quantity,
            movement_id,
        })
    }

    /// Inserts a new item; when the initial quantity is positive, records the
    /// paired inbound movement in the same transaction.
    ///
    /// An item is never observable with nonzero quantity and no movement.
    pub async fn create_with_initial_stock(
        &self,
        fields: &ItemFields,
        actor_id: Option<i64>,
    ) -> LedgerResult<Item> {
        debug!(code = %fields.code, initial = fields.quantity, "Creating item");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                code, name, description, quantity, unit_kind, unit_price,
                stock_min, stock_max, entered_at, image_url, image_ref,
                category_id, supplier_id
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11,
                $12, $13
            )
            RETURNING *
            "#,
        )
        .bind(&fields.code)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.quantity)
        .bind(fields.unit_kind)
        .bind(fields.unit_price)
        .bind(fields.stock_min)
        .bind(fields.stock_max)
        .bind(fields.entered_at)
        .bind(&fields.image_url)
        .bind(&fields.image_ref)
        .bind(fields.category_id)
        .bind(fields.supplier_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if item.quantity > 0 {
            insert_movement(
                &mut tx,
                Some(item.id),
                MovementKind::Inbound,
                item.quantity,
                actor_id,
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(item)
    }

    /// Overwrites an item's fields and appends an `edited` movement, in one
    /// transaction.
    ///
    /// Quantity here is *set*, not adjusted - the movement carries the
    /// submitted value as information only. This path takes no row lock, so
    /// an edit racing a concurrent delta can clobber it; that looseness is
    /// inherited behavior, kept on purpose (see DESIGN.md).
    pub async fn record_edit(
        &self,
        item_id: i64,
        fields: &ItemFields,
        actor_id: Option<i64>,
    ) -> LedgerResult<Item> {
        debug!(item_id, "Editing item");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                code = $2,
                name = $3,
                description = $4,
                quantity = $5,
                unit_kind = $6,
                unit_price = $7,
                stock_min = $8,
                stock_max = $9,
                entered_at = $10,
                image_url = $11,
                image_ref = $12,
                category_id = $13,
                supplier_id = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(&fields.code)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.quantity)
        .bind(fields.unit_kind)
        .bind(fields.unit_price)
        .bind(fields.stock_min)
        .bind(fields.stock_max)
        .bind(fields.entered_at)
        .bind(&fields.image_url)
        .bind(&fields.image_ref)
        .bind(fields.category_id)
        .bind(fields.supplier_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let Some(item) = item else {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(LedgerError::ItemNotFound { id: item_id });
        };

        insert_movement(
            &mut tx,
            Some(item_id),
            MovementKind::Edited,
            fields.quantity,
            actor_id,
        )
        .await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(item)
    }

    /// Deletes an item, first writing a tombstone movement that snapshots
    /// its name and code.
    ///
    /// The snapshot must be captured before the row disappears - afterwards
    /// there is nothing left to join against. The tombstone's `item_id` is
    /// nulled by the FK when the row is deleted; the snapshot columns keep
    /// the identity readable.
    pub async fn delete_with_snapshot(
        &self,
        item_id: i64,
        actor_id: Option<i64>,
    ) -> LedgerResult<DeletedItem> {
        debug!(item_id, "Deleting item");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let snapshot = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT name, code, image_ref FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let Some((name, code, image_ref)) = snapshot else {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(LedgerError::ItemNotFound { id: item_id });
        };

        sqlx::query(
            r#"
            INSERT INTO movements (item_id, kind, quantity, actor_id, item_name, item_code)
            VALUES ($1, $2, 0, $3, $4, $5)
            "#,
        )
        .bind(item_id)
        .bind(MovementKind::Deleted)
        .bind(actor_id)
        .bind(&name)
        .bind(&code)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(DeletedItem {
            id: item_id,
            name,
            code,
            image_ref,
        })
    }
}

// =============================================================================
// Locking Primitive
// =============================================================================

/// Reads an item's quantity under an exclusive row lock.
///
/// The only place in the crate that spells `FOR UPDATE`; everything above it
/// is independent of how the store locks rows. Returns `None` when the item
/// does not exist (nothing locked).
async fn fetch_quantity_for_update(
    tx: &mut Transaction<'_, Postgres>,
    item_id: i64,
) -> DbResult<Option<i64>> {
    let quantity = sqlx::query_scalar::<_, i64>("SELECT quantity FROM items WHERE id = $1 FOR UPDATE")
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(quantity)
}

/// Appends a movement row inside the caller's transaction.
async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Option<i64>,
    kind: MovementKind,
    quantity: i64,
    actor_id: Option<i64>,
) -> DbResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO movements (item_id, kind, quantity, actor_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(item_id)
    .bind(kind)
    .bind(quantity)
    .bind(actor_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}
