//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │    Movement     │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  code (unique)  │   │  item_id (opt)  │   │  name (unique)  │       │
//! │  │  quantity ≥ 0   │   │  kind           │   │  password_hash  │       │
//! │  │  unit_price     │   │  quantity       │   │  role           │       │
//! │  └─────────────────┘   │  snapshot cols  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │    UnitKind     │   │  MovementKind   │                              │
//! │  │  Kilogram       │   │  Inbound        │                              │
//! │  │  Liter          │   │  Outbound       │                              │
//! │  │  Piece (dflt)   │   │  Edited         │                              │
//! │  └─────────────────┘   │  Deleted        │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `Movement` keeps a nullable item reference plus denormalized
//! `item_name`/`item_code` columns filled at deletion time, so the audit
//! trail outlives the items it describes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Unit Kind
// =============================================================================

/// The unit an item's quantity is counted in.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "unit_kind", rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Sold/counted by mass.
    Kilogram,
    /// Sold/counted by volume.
    Liter,
    /// Sold/counted per piece (the default).
    Piece,
}

impl UnitKind {
    /// Wire name of the unit kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Kilogram => "kilogram",
            UnitKind::Liter => "liter",
            UnitKind::Piece => "piece",
        }
    }

    /// Normalizes free-form input to a unit kind.
    ///
    /// Unknown or missing values fall back to [`UnitKind::Piece`] rather
    /// than failing: unit kind is descriptive, not load-bearing.
    pub fn normalize(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("kilogram") => UnitKind::Kilogram,
            Some(v) if v.eq_ignore_ascii_case("liter") => UnitKind::Liter,
            _ => UnitKind::Piece,
        }
    }
}

impl Default for UnitKind {
    fn default() -> Self {
        UnitKind::Piece
    }
}

// =============================================================================
// Movement Kind
// =============================================================================

/// What a movement records.
///
/// `Inbound`/`Outbound` carry a positive magnitude and adjust the item's
/// quantity. `Edited` carries the submitted quantity as information only.
/// `Deleted` is a tombstone and always carries quantity 0.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "movement_kind", rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Inbound,
    Outbound,
    Edited,
    Deleted,
}

impl MovementKind {
    /// Wire name of the movement kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "inbound",
            MovementKind::Outbound => "outbound",
            MovementKind::Edited => "edited",
            MovementKind::Deleted => "deleted",
        }
    }

    /// Parses a wire name, returning `None` for anything unknown.
    ///
    /// Lenient by design: report filters ignore unknown kinds instead of
    /// rejecting the request.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim() {
            "inbound" => Some(MovementKind::Inbound),
            "outbound" => Some(MovementKind::Outbound),
            "edited" => Some(MovementKind::Edited),
            "deleted" => Some(MovementKind::Deleted),
            _ => None,
        }
    }

    /// True for the two kinds that change an item's quantity.
    pub fn is_delta(&self) -> bool {
        matches!(self, MovementKind::Inbound | MovementKind::Outbound)
    }
}

// =============================================================================
// Item
// =============================================================================

/// An inventory item.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// System-assigned identifier.
    pub id: i64,

    /// User-assigned business code, unique across items.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Current stock level. Never negative.
    pub quantity: i64,

    /// Unit the quantity is counted in.
    pub unit_kind: UnitKind,

    /// Price per unit.
    pub unit_price: Decimal,

    /// Reorder threshold: at or below this the item is "low stock".
    pub stock_min: i64,

    /// Informational upper threshold.
    pub stock_max: i64,

    /// Date the item entered the inventory, if recorded.
    pub entered_at: Option<NaiveDate>,

    /// Public URL of the item's image, if any.
    pub image_url: Option<String>,

    /// Opaque media-host asset id; `None` for externally hosted images.
    pub image_ref: Option<String>,

    /// Optional category reference. Category deletion is blocked while
    /// referenced.
    pub category_id: Option<i64>,

    /// Optional supplier reference. Supplier deletion is blocked while
    /// referenced.
    pub supplier_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable fields of an item, used for both creation and edits.
///
/// On creation `quantity` is the initial stock (a paired inbound movement is
/// recorded when it is positive). On edit `quantity` overwrites the stored
/// value directly - it is NOT a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFields {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub unit_kind: UnitKind,
    pub unit_price: Decimal,
    pub stock_min: i64,
    pub stock_max: i64,
    pub entered_at: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub image_ref: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
}

// =============================================================================
// Movement
// =============================================================================

/// One entry in the stock audit trail.
///
/// Append-only from the ledger's point of view: ledger operations never
/// update or delete movements. Deleting an item appends a tombstone, it does
/// not remove history.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,

    /// The item this movement refers to. Nulled when the item is deleted;
    /// the snapshot fields below keep the identity readable.
    pub item_id: Option<i64>,

    pub kind: MovementKind,

    /// Positive magnitude for inbound/outbound; informational for edited;
    /// always 0 for deleted.
    pub quantity: i64,

    /// The user who performed the operation, if known.
    pub actor_id: Option<i64>,

    pub occurred_at: DateTime<Utc>,

    /// Item name snapshot, filled at item deletion.
    pub item_name: Option<String>,

    /// Item code snapshot, filled at item deletion.
    pub item_code: Option<String>,
}

// =============================================================================
// Reference Entities
// =============================================================================

/// A product category.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A supplier of items.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// A user account, including the stored credential.
///
/// Never serialized to API responses as-is; use [`UserPublic`] for that.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Argon2 PHC-format hash. Never the plaintext password.
    pub password_hash: String,
    pub role: String,
}

/// The externally visible projection of a user.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i64,
    pub name: String,
    pub role: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        UserPublic {
            id: user.id,
            name: user.name,
            role: user.role,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_kind_normalizes_unknown_to_piece() {
        assert_eq!(UnitKind::normalize(Some("kilogram")), UnitKind::Kilogram);
        assert_eq!(UnitKind::normalize(Some("Liter")), UnitKind::Liter);
        assert_eq!(UnitKind::normalize(Some("bucket")), UnitKind::Piece);
        assert_eq!(UnitKind::normalize(Some("")), UnitKind::Piece);
        assert_eq!(UnitKind::normalize(None), UnitKind::Piece);
    }

    #[test]
    fn movement_kind_wire_names_round() {
        for kind in [
            MovementKind::Inbound,
            MovementKind::Outbound,
            MovementKind::Edited,
            MovementKind::Deleted,
        ] {
            assert_eq!(MovementKind::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(MovementKind::from_wire("entrada"), None);
        assert_eq!(MovementKind::from_wire(""), None);
    }

    #[test]
    fn only_inbound_outbound_are_deltas() {
        assert!(MovementKind::Inbound.is_delta());
        assert!(MovementKind::Outbound.is_delta());
        assert!(!MovementKind::Edited.is_delta());
        assert!(!MovementKind::Deleted.is_delta());
    }

    #[test]
    fn user_public_drops_credential() {
        let user = User {
            id: 7,
            name: "ana".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: "Employee".to_string(),
        };
        let public = UserPublic::from(user);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"ana\""));
    }
}
