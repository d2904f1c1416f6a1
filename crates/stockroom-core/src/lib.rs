//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate is the **heart** of the inventory service. It contains the
//! domain types and business rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      HTTP API (axum)                            │   │
//! │  │    /api/items  /api/movements  /api/reports  /api/users ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   stock   │  │ validation│                  │   │
//! │  │   │   Item    │  │  deltas   │  │   rules   │                  │   │
//! │  │   │ Movement  │  │  windows  │  │  checks   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db (Database Layer)                  │   │
//! │  │          PostgreSQL queries, migrations, stock ledger           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Movement, Category, Supplier, User)
//! - [`stock`] - Stock arithmetic: signed delta application, never below zero
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Money**: Prices are `rust_decimal::Decimal`, never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use stock::Direction;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Role assigned to users created without an explicit role.
///
/// Roles are free-form text; this is the only value the system itself
/// assigns, other values are accepted as-is.
pub const DEFAULT_USER_ROLE: &str = "Employee";

/// Largest single stock delta a request may apply.
///
/// Prevents accidental over-entry (e.g. typing 1000000 instead of 100).
pub const MAX_DELTA_QUANTITY: i64 = 1_000_000;
