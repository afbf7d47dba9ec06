//! # Settlement Module
//!
//! Pure payment-plan math for order settlement: merging tender legs,
//! validating tendered totals, and computing change against the cash leg.
//!
//! ## Settlement Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Order total: R$ 100.00                                          │
//! │  Cashier enters: R$ 60.00 DINHEIRO + R$ 50.00 CARTAO             │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  settle_payments() ← THIS MODULE                                 │
//! │       │                                                          │
//! │       ├── tendered 110.00 > total 100.00 → change 10.00          │
//! │       ├── change comes out of the cash leg: 60.00 − 10.00        │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  Plan: DINHEIRO 50.00 + CARTAO 50.00, change 10.00               │
//! │  (the drawer only physically receives amount − change)           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions here are pure; persistence and ledger side effects live in
//! varejo-db's checkout service.

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{PaymentDraft, PaymentMethod};
use crate::validation::validate_payment_amount;
use crate::{CASH_TOLERANCE_CENTS, DISCOUNT_TOLERANCE_BPS};

// =============================================================================
// Tender Plan
// =============================================================================

/// A normalized payment plan ready for persistence.
///
/// Legs are merged one-per-method, the cash leg already has change
/// subtracted, and zero legs are dropped. `Σ legs.amount_cents` equals the
/// order total within [`CASH_TOLERANCE_CENTS`].
#[derive(Debug, Clone)]
pub struct TenderPlan {
    pub legs: Vec<PaymentDraft>,

    /// Cash returned to the customer.
    pub change_cents: i64,
}

impl TenderPlan {
    /// Sum of all persisted legs, in cents.
    pub fn total_cents(&self) -> i64 {
        self.legs.iter().map(|l| l.amount_cents).sum()
    }

    /// The crediário legs of the plan (each one spawns a receivable).
    pub fn crediario_legs(&self) -> impl Iterator<Item = &PaymentDraft> {
        self.legs
            .iter()
            .filter(|l| l.method == PaymentMethod::Crediario)
    }

    /// The digital legs (PIX/CARTAO), recognized in the ledger at settlement.
    pub fn digital_legs(&self) -> impl Iterator<Item = &PaymentDraft> {
        self.legs
            .iter()
            .filter(|l| matches!(l.method, PaymentMethod::Pix | PaymentMethod::Cartao))
    }
}

// =============================================================================
// Order Total
// =============================================================================

/// Computes the order total: Σ(quantity × unit price), minus the percentage
/// discount.
pub fn order_total(items: &[crate::types::OrderItem], discount_bps: u32) -> Money {
    let subtotal = items
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.line_total());
    subtotal.apply_percentage_discount(discount_bps)
}

// =============================================================================
// Discount Authorization
// =============================================================================

/// Re-validates a discount against the seller's ceiling.
///
/// The ceiling passed in may already be an owner-override ceiling; UI-time
/// authorization state is never trusted, so this runs on every settlement.
/// A discount may exceed the ceiling by at most [`DISCOUNT_TOLERANCE_BPS`].
pub fn authorize_discount(requested_bps: u32, ceiling_bps: u32) -> Result<(), CoreError> {
    if requested_bps > ceiling_bps.saturating_add(DISCOUNT_TOLERANCE_BPS) {
        return Err(CoreError::DiscountOverCeiling {
            requested_bps,
            ceiling_bps,
        });
    }
    Ok(())
}

// =============================================================================
// Payment Settlement
// =============================================================================

/// Merges tender legs by method, preserving first-seen order: one row per
/// method per order. The first explicit due date wins for merged crediário
/// legs.
pub fn merge_legs(payments: &[PaymentDraft]) -> Vec<PaymentDraft> {
    let mut legs: Vec<PaymentDraft> = Vec::new();
    for leg in payments {
        match legs.iter_mut().find(|l| l.method == leg.method) {
            Some(existing) => {
                existing.amount_cents += leg.amount_cents;
                if existing.due_date.is_none() {
                    existing.due_date = leg.due_date;
                }
            }
            None => legs.push(leg.clone()),
        }
    }
    legs
}

/// Normalizes a set of tender legs against an order total.
///
/// ## What This Does
/// 1. Validates every leg amount is positive
/// 2. Merges legs by method (one row per method per order); the first
///    explicit due date wins for merged crediário legs
/// 3. Rejects crediário tender without a customer
/// 4. Checks the tendered total covers the order total within one cent
/// 5. Subtracts any excess beyond one cent (the change) from the DINHEIRO
///    leg; fails when there is no cash leg able to absorb it
///
/// ## Errors
/// - [`CoreError::PaymentMismatch`] - tendered total short of the order total
/// - [`CoreError::ChangeWithoutCashTender`] - change owed, no sufficient cash leg
/// - [`CoreError::CrediarioRequiresCustomer`]
pub fn settle_payments(
    total: Money,
    payments: &[PaymentDraft],
    has_customer: bool,
) -> Result<TenderPlan, CoreError> {
    for leg in payments {
        validate_payment_amount(leg.amount_cents)?;
    }

    let mut legs = merge_legs(payments);

    if legs.iter().any(|l| l.method == PaymentMethod::Crediario) && !has_customer {
        return Err(CoreError::CrediarioRequiresCustomer);
    }

    let tendered: i64 = legs.iter().map(|l| l.amount_cents).sum();

    if tendered < total.cents() - CASH_TOLERANCE_CENTS {
        return Err(CoreError::PaymentMismatch {
            expected_cents: total.cents(),
            tendered_cents: tendered,
        });
    }

    let excess = tendered - total.cents();
    let mut change_cents = 0;

    if excess > CASH_TOLERANCE_CENTS {
        // The drawer only physically receives amount − change, so the excess
        // must come out of the cash leg before persisting.
        let cash = legs
            .iter_mut()
            .find(|l| l.method == PaymentMethod::Dinheiro)
            .ok_or(CoreError::ChangeWithoutCashTender {
                change_cents: excess,
            })?;

        if cash.amount_cents < excess {
            return Err(CoreError::ChangeWithoutCashTender {
                change_cents: excess,
            });
        }

        cash.amount_cents -= excess;
        change_cents = excess;

        // A cash leg fully consumed by change carries no information.
        legs.retain(|l| l.amount_cents > 0);
    }

    Ok(TenderPlan { legs, change_cents })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderItem;

    fn leg(method: PaymentMethod, cents: i64) -> PaymentDraft {
        PaymentDraft::new(method, cents)
    }

    #[test]
    fn test_order_total_with_discount() {
        let items = vec![
            OrderItem {
                variant_id: "v1".to_string(),
                name: "Camiseta".to_string(),
                quantity: 2,
                unit_price_cents: 4000,
            },
            OrderItem {
                variant_id: "v2".to_string(),
                name: "Bermuda".to_string(),
                quantity: 1,
                unit_price_cents: 2000,
            },
        ];
        // Subtotal 100.00, 10% off = 90.00
        assert_eq!(order_total(&items, 1000).cents(), 9000);
        assert_eq!(order_total(&items, 0).cents(), 10000);
    }

    #[test]
    fn test_exact_tender_passes_through() {
        let plan = settle_payments(
            Money::from_cents(10000),
            &[leg(PaymentMethod::Dinheiro, 10000)],
            false,
        )
        .unwrap();

        assert_eq!(plan.legs.len(), 1);
        assert_eq!(plan.legs[0].amount_cents, 10000);
        assert_eq!(plan.change_cents, 0);
    }

    /// Order total 100.00, tendered 60.00 cash + 50.00 card: the persisted
    /// cash leg becomes 50.00 and change is 10.00.
    #[test]
    fn test_change_subtracted_from_cash_leg() {
        let plan = settle_payments(
            Money::from_cents(10000),
            &[
                leg(PaymentMethod::Dinheiro, 6000),
                leg(PaymentMethod::Cartao, 5000),
            ],
            false,
        )
        .unwrap();

        assert_eq!(plan.change_cents, 1000);
        assert_eq!(plan.total_cents(), 10000);
        let cash = plan
            .legs
            .iter()
            .find(|l| l.method == PaymentMethod::Dinheiro)
            .unwrap();
        assert_eq!(cash.amount_cents, 5000);
    }

    #[test]
    fn test_change_without_cash_leg_fails() {
        let err = settle_payments(
            Money::from_cents(10000),
            &[leg(PaymentMethod::Cartao, 11000)],
            false,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::ChangeWithoutCashTender { change_cents: 1000 }
        ));
    }

    #[test]
    fn test_change_exceeding_cash_leg_fails() {
        // 5.00 cash cannot absorb 10.00 of change.
        let err = settle_payments(
            Money::from_cents(10000),
            &[
                leg(PaymentMethod::Dinheiro, 500),
                leg(PaymentMethod::Cartao, 10500),
            ],
            false,
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::ChangeWithoutCashTender { .. }));
    }

    #[test]
    fn test_cash_leg_fully_consumed_by_change_is_dropped() {
        let plan = settle_payments(
            Money::from_cents(10000),
            &[
                leg(PaymentMethod::Dinheiro, 1000),
                leg(PaymentMethod::Cartao, 10000),
            ],
            false,
        )
        .unwrap();

        assert_eq!(plan.change_cents, 1000);
        assert_eq!(plan.legs.len(), 1);
        assert_eq!(plan.legs[0].method, PaymentMethod::Cartao);
    }

    #[test]
    fn test_under_tender_fails() {
        let err = settle_payments(
            Money::from_cents(10000),
            &[leg(PaymentMethod::Dinheiro, 9000)],
            false,
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::PaymentMismatch { .. }));
    }

    #[test]
    fn test_one_cent_tolerance_accepted() {
        // One cent short or over is rounding noise, not an error.
        assert!(settle_payments(
            Money::from_cents(10000),
            &[leg(PaymentMethod::Pix, 9999)],
            false,
        )
        .is_ok());

        let plan = settle_payments(
            Money::from_cents(10000),
            &[leg(PaymentMethod::Pix, 10001)],
            false,
        )
        .unwrap();
        assert_eq!(plan.change_cents, 0);
        assert_eq!(plan.legs[0].amount_cents, 10001);
    }

    #[test]
    fn test_crediario_requires_customer() {
        let err = settle_payments(
            Money::from_cents(8000),
            &[leg(PaymentMethod::Crediario, 8000)],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::CrediarioRequiresCustomer));

        assert!(settle_payments(
            Money::from_cents(8000),
            &[leg(PaymentMethod::Crediario, 8000)],
            true,
        )
        .is_ok());
    }

    #[test]
    fn test_duplicate_method_legs_merged() {
        let plan = settle_payments(
            Money::from_cents(10000),
            &[
                leg(PaymentMethod::Dinheiro, 4000),
                leg(PaymentMethod::Dinheiro, 6000),
            ],
            false,
        )
        .unwrap();

        assert_eq!(plan.legs.len(), 1);
        assert_eq!(plan.legs[0].amount_cents, 10000);
    }

    #[test]
    fn test_zero_amount_leg_rejected() {
        let err = settle_payments(
            Money::from_cents(10000),
            &[leg(PaymentMethod::Dinheiro, 0)],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_authorize_discount_within_ceiling() {
        assert!(authorize_discount(1000, 1500).is_ok());
        assert!(authorize_discount(1500, 1500).is_ok());
        // 0.01 pp tolerance
        assert!(authorize_discount(1501, 1500).is_ok());
    }

    #[test]
    fn test_authorize_discount_over_ceiling() {
        let err = authorize_discount(1502, 1500).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DiscountOverCeiling {
                requested_bps: 1502,
                ceiling_bps: 1500
            }
        ));
    }
}
