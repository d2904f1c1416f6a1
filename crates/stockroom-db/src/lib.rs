//! # stockroom-db: Database Layer for Stockroom
//!
//! This crate provides database access for the inventory service.
//! It uses PostgreSQL with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/items/{id}/consume)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │  StockLedger  │   │ Repositories │    │   │
//! │  │   │   (pool.rs)   │   │  (ledger.rs)  │   │ (repository/)│    │   │
//! │  │   │               │   │               │   │              │    │   │
//! │  │   │ PgPool        │◄──│ row-locked    │   │ items        │    │   │
//! │  │   │ Migrations    │   │ transactions  │   │ movements    │    │   │
//! │  │   │               │   │               │   │ reports ...  │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                         PostgreSQL                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`ledger`] - The stock ledger: quantity + audit trail as one unit
//! - [`repository`] - Plain CRUD and reporting queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("postgres://localhost/stockroom");
//! let db = Database::connect(config).await?;
//!
//! let outcome = db
//!     .ledger()
//!     .apply_delta(item_id, 3, Direction::Outbound, Some(actor))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::{DeletedItem, DeltaOutcome, LedgerError, StockLedger};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::item::ItemRepository;
pub use repository::movement::MovementRepository;
pub use repository::report::{MovementFilter, ReportRepository, ReportWindow};
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
