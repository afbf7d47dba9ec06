//! # Costing Module
//!
//! Moving weighted-average cost for restocks.
//!
//! ## How The Average Moves
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Product with 10 units on hand at R$ 5.00 average cost           │
//! │  Restock arrives: 10 units at R$ 7.00                            │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  newCost = (10 × 5.00 + 10 × 7.00) / (10 + 10) = R$ 6.00         │
//! │                                                                  │
//! │  Existing and incoming units blend proportionally to quantity.   │
//! │  When on-hand stock is zero, the average resets to the incoming  │
//! │  unit cost (0 × C contributes nothing).                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock figure is the product's total across **all** variants, not the
//! restocked variant alone: all variants of one product share a single cost
//! basis (same garment, different size/color).

use crate::money::Money;

/// Computes the new product-level weighted-average cost after a restock.
///
/// ## Arguments
/// * `current_stock` - total stock across all the product's variants,
///   before the restock
/// * `current_cost` - the product's current average unit cost
/// * `quantity` - incoming units
/// * `unit_cost` - cost per incoming unit
///
/// Negative on-hand stock (not reachable in steady state) is treated as
/// zero so a corrupt count can never produce a negative cost basis.
/// Uses i128 intermediates with half-up rounding.
///
/// ## Example
/// ```rust
/// use varejo_core::costing::weighted_average_cost;
/// use varejo_core::money::Money;
///
/// let cost = weighted_average_cost(10, Money::from_cents(500), 10, Money::from_cents(700));
/// assert_eq!(cost.cents(), 600);
/// ```
pub fn weighted_average_cost(
    current_stock: i64,
    current_cost: Money,
    quantity: i64,
    unit_cost: Money,
) -> Money {
    let on_hand = current_stock.max(0);
    let divisor = on_hand + quantity;

    if divisor <= 0 {
        return unit_cost;
    }

    let blended = on_hand as i128 * current_cost.cents() as i128
        + quantity as i128 * unit_cost.cents() as i128;
    let rounded = (blended + divisor as i128 / 2) / divisor as i128;

    Money::from_cents(rounded as i64)
}

// =============================================================================
// Unit Tests
// =============================================================================
