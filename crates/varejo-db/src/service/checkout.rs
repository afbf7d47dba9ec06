//! # Checkout Service
//!
//! Order settlement: the central orchestrator calling into payments,
//! receivables, the treasury ledger, inventory, and the open register.
//!
//! ## Settlement Transaction
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  submit_order(target = COMPLETED)          ── one transaction ── │
//! │                                                                  │
//! │  1. validate items, re-validate discount ceiling                 │
//! │  2. normalize tender (merge legs, change from the cash leg)      │
//! │  3. upsert order row, link to the open register                  │
//! │  4. replace payments (overwrite, not additive)                   │
//! │  5. crediário legs  → accounts receivable                        │
//! │  6. pix/cartão legs → treasury IN digital_sale                   │
//! │  7. per line item   → guarded stock decrement + movement log     │
//! │                                                                  │
//! │  Steps 5-7 run only on the transition into COMPLETED from a      │
//! │  non-COMPLETED state. Re-saving a completed order repeats none   │
//! │  of them: the ledger is append-only and stock moves exactly once.│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! DINHEIRO is deliberately absent from step 6: cash is reconciled against
//! the drawer at register close, and CREDIARIO reaches the ledger only when
//! the receivable is collected.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::{new_id, order, product, receivable, register, treasury};
use crate::service::{ServiceError, ServiceResult};
use varejo_core::settlement::{self, TenderPlan};
use varejo_core::validation::{validate_discount_bps, validate_order_items, validate_payment_amount};
use varejo_core::{
    AccountReceivable, Cashier, CoreError, Money, MovementType, Order, OrderDraft, OrderStatus,
    Payment, ReceivableStatus, TreasuryCategory, TreasuryDirection, ValidationError,
    CREDIARIO_DEFAULT_TERM_DAYS,
};

/// Order settlement operations.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Creates or updates an order, settling it when the target status is
    /// COMPLETED.
    ///
    /// ## Errors
    /// - [`CoreError::DiscountOverCeiling`] - the cashier's ceiling is
    ///   re-checked here on every submission
    /// - [`CoreError::PaymentMismatch`] / [`CoreError::ChangeWithoutCashTender`]
    /// - [`CoreError::CrediarioRequiresCustomer`]
    /// - [`CoreError::InsufficientStock`] - names the item and what is left
    /// - [`CoreError::NotFound`] - unknown order or variant
    pub async fn submit_order(&self, cashier: &Cashier, draft: OrderDraft) -> ServiceResult<Order> {
        // Shape and authorization checks before anything touches the store.
        validate_order_items(&draft.items)?;
        validate_discount_bps(draft.discount_bps)?;
        settlement::authorize_discount(draft.discount_bps, cashier.max_discount_bps)?;

        let completing = draft.target_status == OrderStatus::Completed;

        if completing && draft.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        let total = settlement::order_total(&draft.items, draft.discount_bps);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let existing = match &draft.order_id {
            Some(id) => Some(
                order::order_by_id(&mut tx, id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Order", id))?,
            ),
            None => None,
        };

        // Idempotent re-save: an order that already completed keeps its
        // financial state untouched. No second deduction, no second ledger
        // entry, no payment rewrite.
        if let Some(completed) = existing
            .as_ref()
            .filter(|o| o.status == OrderStatus::Completed)
        {
            debug!(order_id = %completed.id, "Re-save of completed order, skipping side effects");

            let mut resaved = completed.clone();
            if draft.customer_id.is_some() {
                resaved.customer_id = draft.customer_id.clone();
            }
            resaved.updated_at = now;
            order::update_order(&mut tx, &resaved).await?;

            tx.commit().await?;
            return Ok(resaved);
        }

        let plan = if completing {
            settlement::settle_payments(total, &draft.payments, draft.customer_id.is_some())?
        } else {
            // A pending order stores its tender as entered; totals are only
            // enforced at the settlement transition.
            for leg in &draft.payments {
                validate_payment_amount(leg.amount_cents)?;
            }
            TenderPlan {
                legs: settlement::merge_legs(&draft.payments),
                change_cents: 0,
            }
        };

        // A completing order belongs to the session that rang it up.
        let cash_register_id = if completing {
            register::open_register(&mut tx).await?.map(|r| r.id)
        } else {
            existing.as_ref().and_then(|o| o.cash_register_id.clone())
        };

        let items_json =
            serde_json::to_string(&draft.items).map_err(|e| DbError::Internal(e.to_string()))?;

        let order_row = Order {
            id: existing
                .as_ref()
                .map(|o| o.id.clone())
                .unwrap_or_else(new_id),
            customer_id: draft.customer_id.clone(),
            cash_register_id,
            status: draft.target_status,
            items_json,
            total_cents: total.cents(),
            discount_bps: draft.discount_bps as i64,
            is_active: true,
            created_at: existing.as_ref().map(|o| o.created_at).unwrap_or(now),
            updated_at: now,
            completed_at: completing.then_some(now),
        };

        if existing.is_some() {
            order::update_order(&mut tx, &order_row).await?;
        } else {
            order::insert_order(&mut tx, &order_row).await?;
        }

        // Payments are overwrite, not additive.
        let payments: Vec<Payment> = plan
            .legs
            .iter()
            .map(|leg| Payment {
                id: new_id(),
                order_id: order_row.id.clone(),
                method: leg.method,
                amount_cents: leg.amount_cents,
                created_at: now,
            })
            .collect();
        order::replace_payments(&mut tx, &order_row.id, &payments).await?;

        // Stale draft receivables go with the stale payments.
        receivable::delete_for_order(&mut tx, &order_row.id).await?;

        if completing {
            // Crediário legs spawn receivables, due in 30 days unless the
            // cashier negotiated a date.
            for leg in plan.crediario_legs() {
                let customer_id = draft
                    .customer_id
                    .clone()
                    .ok_or(CoreError::CrediarioRequiresCustomer)?;

                let row = AccountReceivable {
                    id: new_id(),
                    order_id: order_row.id.clone(),
                    customer_id,
                    amount_cents: leg.amount_cents,
                    due_date: leg
                        .due_date
                        .unwrap_or(now + Duration::days(CREDIARIO_DEFAULT_TERM_DAYS)),
                    status: ReceivableStatus::Pending,
                    created_at: now,
                    paid_at: None,
                };
                receivable::insert_receivable(&mut tx, &row).await?;
            }

            // PIX/CARTAO are cash-equivalent at settlement time.
            for leg in plan.digital_legs() {
                let entry = treasury::entry(
                    format!("Digital sale ({:?}) for order {}", leg.method, order_row.id),
                    Money::from_cents(leg.amount_cents),
                    TreasuryDirection::In,
                    TreasuryCategory::DigitalSale,
                    now,
                );
                treasury::insert_entry(&mut tx, &entry).await?;
            }

            // Stock moves exactly once, here, at the transition into
            // COMPLETED. The decrement re-checks availability in the same
            // statement; losing the race for the last unit fails the whole
            // transaction.
            for item in &draft.items {
                let variant = product::variant_by_id(&mut tx, &item.variant_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Variant", &item.variant_id))?;

                let deducted =
                    product::try_decrement_stock(&mut tx, &item.variant_id, item.quantity, now)
                        .await?;

                if !deducted {
                    return Err(ServiceError::Core(CoreError::InsufficientStock {
                        sku: variant.sku,
                        available: variant.stock_quantity,
                        requested: item.quantity,
                    }));
                }

                let movement = product::movement(
                    &item.variant_id,
                    MovementType::Out,
                    item.quantity,
                    format!("Sale on order {}", order_row.id),
                    Some(&order_row.id),
                    now,
                );
                product::insert_movement(&mut tx, &movement).await?;
            }
        }

        tx.commit().await?;

        info!(
            order_id = %order_row.id,
            status = ?order_row.status,
            total = %order_row.total_cents,
            legs = payments.len(),
            change = %plan.change_cents,
            "Order submitted"
        );

        Ok(order_row)
    }
}
