//! # Product Repository
//!
//! Database operations for products, variants, and the inventory log.
//!
//! ## Key Operations
//! - Catalog CRUD (products, variants; variants soft-delete only)
//! - Guarded stock decrement for checkout
//! - Stock increment for restock and returns
//! - Append-only stock movement log
//!
//! ## Guarded Decrement
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  UPDATE product_variants                                         │
//! │     SET stock_quantity = stock_quantity - :qty                   │
//! │   WHERE id = :id AND stock_quantity >= :qty                      │
//! │                                                                  │
//! │  rows_affected == 0  →  insufficient stock                       │
//! │                                                                  │
//! │  The availability check and the decrement are one statement, so  │
//! │  two checkouts racing for the last unit cannot both succeed.     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use varejo_core::{MovementType, Product, ProductVariant, StockMovement};

use super::new_id;

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches a product by id.
pub async fn product_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, description, cost_price_cents, is_active,
               created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Fetches a variant by id.
pub async fn variant_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<ProductVariant>> {
    let variant = sqlx::query_as::<_, ProductVariant>(
        r#"
        SELECT id, product_id, sku, name, price_cents, stock_quantity,
               min_stock, is_active, created_at, updated_at
        FROM product_variants
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(variant)
}

/// Inserts a product row.
pub async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, description, cost_price_cents, is_active,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.cost_price_cents)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a variant row.
pub async fn insert_variant(conn: &mut SqliteConnection, variant: &ProductVariant) -> DbResult<()> {
    debug!(id = %variant.id, sku = %variant.sku, "Inserting variant");

    sqlx::query(
        r#"
        INSERT INTO product_variants (
            id, product_id, sku, name, price_cents, stock_quantity,
            min_stock, is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&variant.id)
    .bind(&variant.product_id)
    .bind(&variant.sku)
    .bind(&variant.name)
    .bind(variant.price_cents)
    .bind(variant.stock_quantity)
    .bind(variant.min_stock)
    .bind(variant.is_active)
    .bind(variant.created_at)
    .bind(variant.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Total stock across **all** of a product's variants.
///
/// This is the `S` of the weighted-average formula; the cost basis is
/// product-level, not per-variant.
pub async fn total_product_stock(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(stock_quantity)
        FROM product_variants
        WHERE product_id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(total.unwrap_or(0))
}

/// Updates the product's weighted-average cost.
pub async fn update_product_cost(
    conn: &mut SqliteConnection,
    product_id: &str,
    cost_price_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE products SET
            cost_price_cents = ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(cost_price_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Attempts to decrement a variant's stock.
///
/// Returns `false` when the variant does not hold `quantity` units; the
/// availability re-check and the decrement are one statement.
pub async fn try_decrement_stock(
    conn: &mut SqliteConnection,
    variant_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE product_variants SET
            stock_quantity = stock_quantity - ?2,
            updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(variant_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Increments a variant's stock (restock, restocked return).
pub async fn increment_stock(
    conn: &mut SqliteConnection,
    variant_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE product_variants SET
            stock_quantity = stock_quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(variant_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Appends an inventory-log entry.
pub async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, variant_id, movement_type, quantity, reason, order_id,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.variant_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(&movement.reason)
    .bind(&movement.order_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog and inventory reads plus standalone writes.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product with no variants yet. Cost starts at zero and moves
    /// on the first restock.
    pub async fn create_product(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
            cost_price_cents: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        insert_product(&mut conn, &product).await?;

        debug!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Creates a variant at zero stock.
    pub async fn create_variant(
        &self,
        product_id: &str,
        sku: &str,
        name: &str,
        price_cents: i64,
        min_stock: i64,
    ) -> DbResult<ProductVariant> {
        let now = Utc::now();
        let variant = ProductVariant {
            id: new_id(),
            product_id: product_id.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            price_cents,
            stock_quantity: 0,
            min_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        insert_variant(&mut conn, &variant).await?;

        Ok(variant)
    }

    /// Gets a product by ID.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        product_by_id(&mut conn, id).await
    }

    /// Gets a variant by ID.
    pub async fn get_variant(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let mut conn = self.pool.acquire().await?;
        variant_by_id(&mut conn, id).await
    }

    /// Gets a variant by SKU.
    pub async fn get_variant_by_sku(&self, sku: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, sku, name, price_cents, stock_quantity,
                   min_stock, is_active, created_at, updated_at
            FROM product_variants
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Lists active variants at or below their restock threshold, most
    /// depleted first. Feeds the restock workflow.
    pub async fn list_low_stock(&self, limit: u32) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, sku, name, price_cents, stock_quantity,
                   min_stock, is_active, created_at, updated_at
            FROM product_variants
            WHERE is_active = 1 AND stock_quantity <= min_stock
            ORDER BY stock_quantity ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Inventory log for a variant, newest first.
    pub async fn movements_for_variant(
        &self,
        variant_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, variant_id, movement_type, quantity, reason, order_id,
                   created_at
            FROM stock_movements
            WHERE variant_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(variant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Deactivates a variant (soft delete). Variants with movement history
    /// are never removed from the table.
    pub async fn deactivate_variant(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE product_variants SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::DbError::not_found("Variant", id));
        }

        Ok(())
    }
}

/// Builds a movement record for an incoming or outgoing quantity.
pub fn movement(
    variant_id: &str,
    movement_type: MovementType,
    quantity: i64,
    reason: impl Into<String>,
    order_id: Option<&str>,
    now: DateTime<Utc>,
) -> StockMovement {
    StockMovement {
        id: new_id(),
        variant_id: variant_id.to_string(),
        movement_type,
        quantity,
        reason: reason.into(),
        order_id: order_id.map(str::to_string),
        created_at: now,
    }
}
