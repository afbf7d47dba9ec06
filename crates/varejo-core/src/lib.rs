//! # varejo-core: Pure Business Logic for Varejo POS
//!
//! This crate is the **heart** of Varejo POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                     Varejo POS Architecture                        │
//! │                                                                    │
//! │  ┌──────────────────────────────────────────────────────────────┐ │
//! │  │              External caller (cashier front end)             │ │
//! │  │   open register ─► sell ─► restock ─► return ─► close        │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │  ┌──────────────────────────────▼───────────────────────────────┐ │
//! │  │               ★ varejo-core (THIS CRATE) ★                   │ │
//! │  │                                                              │ │
//! │  │  ┌────────┐ ┌────────┐ ┌────────────┐ ┌─────────┐ ┌──────┐  │ │
//! │  │  │ types  │ │ money  │ │ settlement │ │ costing │ │ vali │  │ │
//! │  │  │ Order  │ │ Money  │ │ TenderPlan │ │ wavg    │ │ dation│ │ │
//! │  │  └────────┘ └────────┘ └────────────┘ └─────────┘ └──────┘  │ │
//! │  │                                                              │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS         │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │  ┌──────────────────────────────▼───────────────────────────────┐ │
//! │  │                  varejo-db (Database Layer)                  │ │
//! │  │        SQLite repositories, migrations, atomic services      │ │
//! │  └──────────────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Payment, CashRegister, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//! - [`settlement`] - Payment-plan normalization and change handling
//! - [`costing`] - Weighted-average cost on restock
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use varejo_core::Money` instead of
// `use varejo_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reconciliation tolerance, in cents.
///
/// Drawer counts and split-tender sums are accepted when they land within
/// one cent of the expected value. A difference of exactly one cent is
/// rounding noise, not breakage.
pub const CASH_TOLERANCE_CENTS: i64 = 1;

/// Discount authorization tolerance, in basis points (1 bp = 0.01 pp).
///
/// A cashier-entered discount may exceed the seller ceiling by at most this
/// much before settlement is blocked.
pub const DISCOUNT_TOLERANCE_BPS: u32 = 1;

/// Maximum line items allowed in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Guards against fat-finger quantities (e.g. typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default payment term for crediário receivables, in days.
///
/// Applied when a CREDIARIO tender leg carries no explicit due date.
pub const CREDIARIO_DEFAULT_TERM_DAYS: i64 = 30;
