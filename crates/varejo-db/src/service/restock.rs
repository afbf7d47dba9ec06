//! # Restock Service
//!
//! Stock intake with product-level weighted-average recosting.
//!
//! ## One Restock Transaction
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  restock(variant, qty = 10, unit_cost = 7.00)  ── one tx ──      │
//! │                                                                  │
//! │  S = total stock across ALL the product's variants               │
//! │  C = product's current weighted-average cost                     │
//! │                                                                  │
//! │  1. new cost = (S·C + qty·unit_cost) / (S + qty)                 │
//! │  2. variant stock += qty                                         │
//! │  3. stock movement IN                                            │
//! │  4. treasury OUT restock (qty × unit_cost)                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read of `S` and the writes share the transaction, so two restocks of
//! different variants of one product cannot blend against a stale total.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::repository::{new_id, product, treasury};
use crate::service::ServiceResult;
use varejo_core::costing::weighted_average_cost;
use varejo_core::validation::{validate_cents, validate_name, validate_quantity, validate_sku};
use varejo_core::{
    CoreError, Money, MovementType, ProductVariant, RestockTarget, TreasuryCategory,
    TreasuryDirection,
};

/// Stock intake operations.
#[derive(Debug, Clone)]
pub struct RestockService {
    pool: SqlitePool,
}

impl RestockService {
    /// Creates a new RestockService.
    pub fn new(pool: SqlitePool) -> Self {
        RestockService { pool }
    }

    /// Restocks a variant, creating it first when the target is a new spec
    /// (new variants start at zero stock and join the product's shared cost
    /// basis immediately).
    ///
    /// Returns the variant with its post-restock stock level.
    pub async fn restock(
        &self,
        target: RestockTarget,
        quantity: i64,
        unit_cost_cents: i64,
    ) -> ServiceResult<ProductVariant> {
        validate_quantity(quantity)?;
        validate_cents("unit cost", unit_cost_cents)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let variant = match target {
            RestockTarget::Existing { variant_id } => product::variant_by_id(&mut tx, &variant_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Variant", &variant_id))?,

            RestockTarget::NewVariant {
                product_id,
                sku,
                name,
                price_cents,
                min_stock,
            } => {
                validate_sku(&sku)?;
                validate_name(&name)?;
                validate_cents("price", price_cents)?;

                product::product_by_id(&mut tx, &product_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Product", &product_id))?;

                let new_variant = ProductVariant {
                    id: new_id(),
                    product_id,
                    sku,
                    name,
                    price_cents,
                    stock_quantity: 0,
                    min_stock,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                product::insert_variant(&mut tx, &new_variant).await?;
                new_variant
            }
        };

        let owner = product::product_by_id(&mut tx, &variant.product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", &variant.product_id))?;

        // S is product-wide: every variant shares one cost basis.
        let total_stock = product::total_product_stock(&mut tx, &variant.product_id).await?;
        let new_cost = weighted_average_cost(
            total_stock,
            owner.cost_price(),
            quantity,
            Money::from_cents(unit_cost_cents),
        );

        product::increment_stock(&mut tx, &variant.id, quantity, now).await?;

        let movement = product::movement(
            &variant.id,
            MovementType::In,
            quantity,
            format!("Restock of {}", variant.sku),
            None,
            now,
        );
        product::insert_movement(&mut tx, &movement).await?;

        product::update_product_cost(&mut tx, &variant.product_id, new_cost.cents(), now).await?;

        // Ledger amounts are strictly positive; donated stock (unit cost 0)
        // writes no expense row.
        let expense_cents = unit_cost_cents * quantity;
        if expense_cents > 0 {
            let entry = treasury::entry(
                format!("Restock of {} x{}", variant.sku, quantity),
                Money::from_cents(expense_cents),
                TreasuryDirection::Out,
                TreasuryCategory::Restock,
                now,
            );
            treasury::insert_entry(&mut tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            variant_id = %variant.id,
            sku = %variant.sku,
            quantity = %quantity,
            unit_cost = %unit_cost_cents,
            new_cost = %new_cost.cents(),
            "Variant restocked"
        );

        Ok(ProductVariant {
            stock_quantity: variant.stock_quantity + quantity,
            updated_at: now,
            ..variant
        })
    }
}
