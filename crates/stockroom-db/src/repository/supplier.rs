//! # Supplier Repository
//!
//! CRUD for suppliers. Same deletion rule as categories: the FK restricts
//! deletion while items reference the supplier.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::Supplier;

/// The writable fields of a supplier.
#[derive(Debug, Clone)]
pub struct SupplierFields {
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
}

/// Repository for supplier operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: PgPool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: PgPool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists all suppliers.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, tax_id, phone, email, address, contact FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    /// Inserts a new supplier.
    pub async fn create(&self, fields: &SupplierFields) -> DbResult<Supplier> {
        debug!(name = %fields.name, "Creating supplier");

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, tax_id, phone, email, address, contact)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, tax_id, phone, email, address, contact
            "#,
        )
        .bind(fields.name.trim())
        .bind(&fields.tax_id)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.contact)
        .fetch_one(&self.pool)
        .await?;
        Ok(supplier)
    }

    /// Updates an existing supplier.
    pub async fn update(&self, id: i64, fields: &SupplierFields) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = $2, tax_id = $3, phone = $4,
                email = $5, address = $6, contact = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.name.trim())
        .bind(&fields.tax_id)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.contact)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }

    /// Deletes a supplier. Fails with a foreign key violation while items
    /// reference it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}
