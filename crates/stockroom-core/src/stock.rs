//! # Stock Arithmetic
//!
//! The pure half of the stock ledger: deciding what a delta does to a
//! quantity. The database half (row locks, transactions) lives in
//! `stockroom-db`; keeping the arithmetic here means the core invariant -
//! quantity never goes negative - is testable without a database.
//!
//! ## Delta Application
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      next_quantity(current, magnitude, dir)             │
//! │                                                                         │
//! │   magnitude <= 0 ──────────────────────────► ValidationError           │
//! │                                                                         │
//! │   Inbound:  current + magnitude ───────────► Ok(new)                   │
//! │                                                                         │
//! │   Outbound: current - magnitude                                        │
//! │       │                                                                 │
//! │       ├── new >= 0 ────────────────────────► Ok(new)                   │
//! │       └── new <  0 ────────────────────────► InsufficientStock         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::MovementKind;
use crate::MAX_DELTA_QUANTITY;

// =============================================================================
// Direction
// =============================================================================

/// Which way a stock delta moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Stock coming in (restock, initial stock).
    Inbound,
    /// Stock going out (consumption).
    Outbound,
}

impl Direction {
    /// The movement kind recorded for a delta in this direction.
    pub fn movement_kind(&self) -> MovementKind {
        match self {
            Direction::Inbound => MovementKind::Inbound,
            Direction::Outbound => MovementKind::Outbound,
        }
    }
}

// =============================================================================
// Delta Application
// =============================================================================

/// Computes the quantity after applying a delta, enforcing the non-negative
/// invariant.
///
/// ## Rules
/// - `magnitude` must be a positive integer no larger than
///   [`MAX_DELTA_QUANTITY`]
/// - inbound adds, outbound subtracts
/// - an outbound that would go below zero fails with
///   [`CoreError::InsufficientStock`] and reports what was available
pub fn next_quantity(current: i64, magnitude: i64, direction: Direction) -> CoreResult<i64> {
    if magnitude <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    if magnitude > MAX_DELTA_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_DELTA_QUANTITY,
        }
        .into());
    }

    match direction {
        Direction::Inbound => Ok(current + magnitude),
        Direction::Outbound => {
            let next = current - magnitude;
            if next < 0 {
                Err(CoreError::InsufficientStock {
                    available: current,
                    requested: magnitude,
                })
            } else {
                Ok(next)
            }
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
    fn inbound_adds() {
        assert_eq!(next_quantity(0, 5, Direction::Inbound).unwrap(), 5);
        assert_eq!(next_quantity(10, 3, Direction::Inbound).unwrap(), 13);
    }

    #[test]
    fn outbound_subtracts() {
        assert_eq!(next_quantity(10, 3, Direction::Outbound).unwrap(), 7);
        // Draining to exactly zero is allowed.
        assert_eq!(next_quantity(4, 4, Direction::Outbound).unwrap(), 0);
    }

    #[test]
    fn outbound_never_goes_negative() {
        let err = next_quantity(3, 5, Direction::Outbound).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Empty shelf, any request fails.
        assert!(next_quantity(0, 1, Direction::Outbound).is_err());
    }

    #[test]
    fn magnitude_must_be_positive() {
        for direction in [Direction::Inbound, Direction::Outbound] {
            assert!(matches!(
                next_quantity(10, 0, direction),
                Err(CoreError::Validation(_))
            ));
            assert!(matches!(
                next_quantity(10, -4, direction),
                Err(CoreError::Validation(_))
            ));
        }
    }

    #[test]
    fn magnitude_is_capped() {
        assert!(next_quantity(0, MAX_DELTA_QUANTITY, Direction::Inbound).is_ok());
        assert!(matches!(
            next_quantity(0, MAX_DELTA_QUANTITY + 1, Direction::Inbound),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn inbound_then_outbound_round_trips() {
        let start = 42;
        let after_in = next_quantity(start, 10, Direction::Inbound).unwrap();
        let after_out = next_quantity(after_in, 10, Direction::Outbound).unwrap();
        assert_eq!(after_out, start);
    }

    #[test]
    fn directions_map_to_movement_kinds() {
        use crate::types::MovementKind;
        assert_eq!(Direction::Inbound.movement_kind(), MovementKind::Inbound);
        assert_eq!(Direction::Outbound.movement_kind(), MovementKind::Outbound);
    }
}
