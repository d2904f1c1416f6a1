//! # Validation Module
//!
//! Input validation rules for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Multipart field parsing                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                        │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::ItemFields;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a display name (item, category, supplier, or user).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a password before hashing. Only emptiness is checked; policy
/// beyond that is out of scope.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an absolute quantity (initial stock, edited stock).
///
/// Zero is allowed here - deltas are validated separately by
/// [`crate::stock::next_quantity`].
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (untracked/free items)
pub fn validate_unit_price(price: Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() {
        return Err(ValidationError::Negative {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

/// Validates a stock threshold (minimum or maximum).
pub fn validate_threshold(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Clamps a requested report limit into `1..=max`, defaulting when absent.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    match requested {
        Some(n) => n.clamp(1, max),
        None => default,
    }
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates the full set of writable item fields, used on create and edit.
pub fn validate_item_fields(fields: &ItemFields) -> ValidationResult<()> {
    validate_code(&fields.code)?;
    validate_name(&fields.name)?;
    validate_quantity(fields.quantity)?;
    validate_unit_price(fields.unit_price)?;
    validate_threshold("stock_min", fields.stock_min)?;
    validate_threshold("stock_max", fields.stock_max)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("TORN-M8").is_ok());
        assert!(validate_code("abc123").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Tornillo M8").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity_allows_zero() {
        assert!(validate_quantity(0).is_ok());
        assert!(validate_quantity(100).is_ok());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(dec("10.99")).is_ok());
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(dec("-0.01")).is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 5, 100), 5);
        assert_eq!(clamp_limit(Some(20), 5, 100), 20);
        assert_eq!(clamp_limit(Some(0), 5, 100), 1);
        assert_eq!(clamp_limit(Some(-3), 5, 100), 1);
        assert_eq!(clamp_limit(Some(5000), 5, 100), 100);
    }

    #[test]
    fn test_validate_item_fields_reports_first_failure() {
        let mut fields = sample_fields();
        assert!(validate_item_fields(&fields).is_ok());

        fields.code = String::new();
        let err = validate_item_fields(&fields).unwrap_err();
        assert_eq!(err.field(), "code");

        fields = sample_fields();
        fields.stock_min = -1;
        let err = validate_item_fields(&fields).unwrap_err();
        assert_eq!(err.field(), "stock_min");
    }

    fn sample_fields() -> ItemFields {
        ItemFields {
            code: "TORN-M8".to_string(),
            name: "Tornillo M8".to_string(),
            description: None,
            quantity: 10,
            unit_kind: Default::default(),
            unit_price: Decimal::new(1250, 2),
            stock_min: 5,
            stock_max: 50,
            entered_at: None,
            image_url: None,
            image_ref: None,
            category_id: None,
            supplier_id: None,
        }
    }

    // Tiny helper so price tests read naturally without the macros crate.
    fn dec(s: &str) -> Decimal {
        use std::str::FromStr;
        Decimal::from_str(s).unwrap()
    }
}
