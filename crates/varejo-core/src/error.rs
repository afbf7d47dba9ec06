//! # Error Types
//!
//! Domain-specific error types for varejo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Error Types                               │
//! │                                                                  │
//! │  varejo-core errors (this file)                                  │
//! │  ├── CoreError        - Business rule violations                 │
//! │  └── ValidationError  - Field-level input failures               │
//! │                                                                  │
//! │  varejo-db errors (separate crate)                               │
//! │  ├── DbError          - Database operation failures              │
//! │  └── ServiceError     - CoreError | DbError at the op boundary   │
//! │                                                                  │
//! │  Flow: ValidationError → CoreError → ServiceError → caller       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (sku, id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each variant renders a human-readable reason for the cashier

use thiserror::Error;

use crate::types::{OrderStatus, ReceivableStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Taxonomy: one conflict variant (duplicate open register), one stock
/// variant (named per item), one not-found variant, and validation for
/// everything a cashier can get wrong. Financial operations fail as a whole;
/// none of these leaves a partial write behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A register is already OPEN. Opening is first-come-first-served.
    #[error("A cash register is already open")]
    RegisterAlreadyOpen,

    /// Close or status-report requested with no OPEN register.
    #[error("No cash register is open")]
    NoOpenRegister,

    /// Cannot transfer more cash to the safe than was physically counted.
    #[error("Transfer of {transfer_cents} exceeds counted cash {counted_cents}")]
    TransferExceedsCounted {
        counted_cents: i64,
        transfer_cents: i64,
    },

    /// Tendered payments do not cover the order total.
    #[error("Payments of {tendered_cents} do not cover order total {expected_cents}")]
    PaymentMismatch {
        expected_cents: i64,
        tendered_cents: i64,
    },

    /// Change is owed but there is no cash leg to subtract it from.
    ///
    /// ## When This Occurs
    /// - Total tendered exceeds the order total
    /// - No DINHEIRO leg exists, or the cash leg is smaller than the change
    #[error("Change of {change_cents} owed without a sufficient cash tender")]
    ChangeWithoutCashTender { change_cents: i64 },

    /// Crediário requires a customer to hold the receivable.
    #[error("Crediário payment requires a selected customer")]
    CrediarioRequiresCustomer,

    /// Discount exceeds the authenticated seller's ceiling.
    ///
    /// Settlement re-validates the discount even when the UI already
    /// authorized it; authorization state is ephemeral.
    #[error("Discount of {requested_bps} bps exceeds ceiling of {ceiling_bps} bps")]
    DiscountOverCeiling {
        requested_bps: u32,
        ceiling_bps: u32,
    },

    /// Insufficient stock to complete a sale.
    ///
    /// ## When This Occurs
    /// - A line item requests more units than the variant holds, checked
    ///   inside the settlement transaction (two checkouts racing for the
    ///   last unit: exactly one sees this error)
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Returning more of an item than the order ever sold, cumulatively.
    #[error("Return of {requested} exceeds sold quantity {sold} for {sku}")]
    ReturnExceedsSold {
        sku: String,
        sold: i64,
        requested: i64,
    },

    /// The order is not in a state that allows the requested operation.
    #[error("Order {order_id} is {status:?}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        status: OrderStatus,
    },

    /// The receivable was already collected.
    #[error("Receivable {id} is {status:?}, cannot mark paid")]
    ReceivableAlreadySettled {
        id: String,
        status: ReceivableStatus,
    },

    /// Entity cannot be found (unknown order/variant/receivable).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Field-level validation failure (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation errors.
///
/// These occur before business logic runs, when caller input does not meet
/// shape requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed items list).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
