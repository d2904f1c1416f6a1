//! # Movement Repository
//!
//! Administrative access to the movement table: the joined listing the UI
//! shows, manual entries, and corrections.
//!
//! The ledger itself never updates or deletes a movement - the PUT/DELETE
//! paths here exist for manual bookkeeping fixes and bypass the ledger
//! entirely (they do not touch item quantities).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{Movement, MovementKind};

// =============================================================================
// Rows
// =============================================================================

/// A movement as listed to clients: joined with the item and user tables,
/// falling back to the snapshot columns when the item is gone.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovementRecord {
    pub id: i64,
    pub item_id: Option<i64>,
    /// Item name at listing time, or the snapshot if the item was deleted.
    pub item_name: Option<String>,
    pub item_code: Option<String>,
    pub kind: MovementKind,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<i64>,
    pub actor_name: Option<String>,
}

/// A manually recorded movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub item_id: Option<i64>,
    pub kind: MovementKind,
    pub quantity: i64,
    pub actor_id: Option<i64>,
    /// Defaults to the database clock when absent.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// A partial correction of a movement. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct MovementChanges {
    pub item_id: Option<i64>,
    pub kind: Option<MovementKind>,
    pub quantity: Option<i64>,
    pub actor_id: Option<i64>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl MovementChanges {
    /// True when there is nothing to update.
    pub fn is_empty(&self) -> bool {
        self.item_id.is_none()
            && self.kind.is_none()
            && self.quantity.is_none()
            && self.actor_id.is_none()
            && self.occurred_at.is_none()
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for movement operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: PgPool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: PgPool) -> Self {
        MovementRepository { pool }
    }

    /// Lists all movements, newest first. Ties on the timestamp break on the
    /// identifier so pagination stays deterministic.
    pub async fn list(&self) -> DbResult<Vec<MovementRecord>> {
        let records = sqlx::query_as::<_, MovementRecord>(
            r#"
            SELECT
                m.id,
                m.item_id,
                COALESCE(m.item_name, i.name) AS item_name,
                COALESCE(m.item_code, i.code) AS item_code,
                m.kind,
                m.quantity,
                m.occurred_at,
                m.actor_id,
                u.name AS actor_name
            FROM movements m
            LEFT JOIN items i ON i.id = m.item_id
            LEFT JOIN users u ON u.id = m.actor_id
            ORDER BY m.occurred_at DESC, m.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Records a manual movement. Does NOT touch any item quantity; stock
    /// adjustments belong to the ledger.
    pub async fn insert(&self, movement: &NewMovement) -> DbResult<Movement> {
        debug!(kind = ?movement.kind, quantity = movement.quantity, "Recording manual movement");

        let movement = sqlx::query_as::<_, Movement>(
            r#"
            INSERT INTO movements (item_id, kind, quantity, actor_id, occurred_at)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING *
            "#,
        )
        .bind(movement.item_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.actor_id)
        .bind(movement.occurred_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(movement)
    }

    /// Applies a partial correction. Callers must reject empty change sets
    /// before reaching here (`MovementChanges::is_empty`).
    pub async fn update(&self, id: i64, changes: &MovementChanges) -> DbResult<()> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE movements SET ");
        let mut fields = qb.separated(", ");

        if let Some(item_id) = changes.item_id {
            fields.push("item_id = ").push_bind_unseparated(item_id);
        }
        if let Some(kind) = changes.kind {
            fields.push("kind = ").push_bind_unseparated(kind);
        }
        if let Some(quantity) = changes.quantity {
            fields.push("quantity = ").push_bind_unseparated(quantity);
        }
        if let Some(actor_id) = changes.actor_id {
            fields.push("actor_id = ").push_bind_unseparated(actor_id);
        }
        if let Some(occurred_at) = changes.occurred_at {
            fields
                .push("occurred_at = ")
                .push_bind_unseparated(occurred_at);
        }

        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Movement", id));
        }
        Ok(())
    }

    /// Removes a movement row.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM movements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Movement", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_change_set_detected() {
        assert!(MovementChanges::default().is_empty());

        let changes = MovementChanges {
            quantity: Some(4),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
