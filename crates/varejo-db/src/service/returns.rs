//! # Returns Service
//!
//! Reverses a subset of a completed order's items, optionally restocking,
//! and records the refund in the ledger.
//!
//! The "never return more than was sold" rule is cumulative: prior return
//! records for the order count against the sold quantity, so three partial
//! returns cannot hand back four units of a three-unit line.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::repository::{new_id, order, product, treasury};
use crate::service::{ServiceError, ServiceResult};
use varejo_core::validation::validate_quantity;
use varejo_core::{
    CoreError, Money, MovementType, OrderReturn, OrderStatus, ReturnItem, TreasuryCategory,
    TreasuryDirection, ValidationError,
};

/// Return processing operations.
#[derive(Debug, Clone)]
pub struct ReturnsService {
    pool: SqlitePool,
}

impl ReturnsService {
    /// Creates a new ReturnsService.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnsService { pool }
    }

    /// Processes a (partial) return against a completed order.
    ///
    /// ## What This Does
    /// 1. Checks each returned quantity against what the order sold, net of
    ///    prior returns
    /// 2. With `restock`: increments variant stock and logs an IN movement
    /// 3. Records the return rows either way (they feed the cumulative guard)
    /// 4. Books the refund as treasury OUT `refund`
    ///
    /// ## Errors
    /// - [`CoreError::InvalidOrderStatus`] - only completed orders return
    /// - [`CoreError::ReturnExceedsSold`]
    pub async fn process_return(
        &self,
        order_id: &str,
        items: &[ReturnItem],
        restock: bool,
        refund_cents: i64,
    ) -> ServiceResult<()> {
        if items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        for item in items {
            validate_quantity(item.quantity)?;
        }
        if refund_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "refund amount".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sold_order = order::order_by_id(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        if sold_order.status != OrderStatus::Completed {
            return Err(ServiceError::Core(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                status: sold_order.status,
            }));
        }

        // A refund can never exceed what the order collected.
        if refund_cents > sold_order.total_cents {
            return Err(ValidationError::OutOfRange {
                field: "refund amount".to_string(),
                min: 1,
                max: sold_order.total_cents,
            }
            .into());
        }

        let sold_items = sold_order
            .items()
            .map_err(|e| DbError::Internal(format!("corrupt items payload: {e}")))?;

        for item in items {
            let variant = product::variant_by_id(&mut tx, &item.variant_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Variant", &item.variant_id))?;

            let sold: i64 = sold_items
                .iter()
                .filter(|sold| sold.variant_id == item.variant_id)
                .map(|sold| sold.quantity)
                .sum();

            let already_returned =
                order::returned_quantity(&mut tx, order_id, &item.variant_id).await?;

            if already_returned + item.quantity > sold {
                return Err(ServiceError::Core(CoreError::ReturnExceedsSold {
                    sku: variant.sku,
                    sold,
                    requested: already_returned + item.quantity,
                }));
            }

            if restock {
                product::increment_stock(&mut tx, &item.variant_id, item.quantity, now).await?;

                let movement = product::movement(
                    &item.variant_id,
                    MovementType::In,
                    item.quantity,
                    format!("Return on order {order_id}"),
                    Some(order_id),
                    now,
                );
                product::insert_movement(&mut tx, &movement).await?;
            }

            let record = OrderReturn {
                id: new_id(),
                order_id: order_id.to_string(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                restocked: restock,
                created_at: now,
            };
            order::insert_return(&mut tx, &record).await?;
        }

        let entry = treasury::entry(
            format!("Refund for order {order_id}"),
            Money::from_cents(refund_cents),
            TreasuryDirection::Out,
            TreasuryCategory::Refund,
            now,
        );
        treasury::insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            items = items.len(),
            restock = restock,
            refund = %refund_cents,
            "Return processed"
        );

        Ok(())
    }
}
