//! # Order Repository
//!
//! Database operations for orders, payments, and return records.
//!
//! ## Order Lifecycle
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Order Lifecycle                             │
//! │                                                                  │
//! │  1. SUBMIT (pending)                                             │
//! │     └── insert_order() → Order { status: Pending }               │
//! │     └── replace_payments() → tender legs on file                 │
//! │                                                                  │
//! │  2. SUBMIT (completed)  ← the settlement transition              │
//! │     └── update_order() → Order { status: Completed }             │
//! │     └── replace_payments(), receivables, ledger, stock           │
//! │         (orchestrated by the checkout service, one transaction)  │
//! │                                                                  │
//! │  3. (OPTIONAL) RETURN                                            │
//! │     └── insert_return() per variant, cumulative guard            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use varejo_core::{MethodTotals, Order, OrderReturn, Payment, PaymentMethod};

const ORDER_COLUMNS: &str = "id, customer_id, cash_register_id, status, items_json, \
     total_cents, discount_bps, is_active, created_at, updated_at, completed_at";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches an order by id.
pub async fn order_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(order)
}

/// Inserts an order row.
pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, status = ?order.status, total = %order.total_cents, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, customer_id, cash_register_id, status, items_json,
            total_cents, discount_bps, is_active,
            created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(&order.cash_register_id)
    .bind(order.status)
    .bind(&order.items_json)
    .bind(order.total_cents)
    .bind(order.discount_bps)
    .bind(order.is_active)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Overwrites an order's mutable state.
pub async fn update_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, status = ?order.status, "Updating order");

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            customer_id = ?2,
            cash_register_id = ?3,
            status = ?4,
            items_json = ?5,
            total_cents = ?6,
            discount_bps = ?7,
            updated_at = ?8,
            completed_at = ?9
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(&order.cash_register_id)
    .bind(order.status)
    .bind(&order.items_json)
    .bind(order.total_cents)
    .bind(order.discount_bps)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", &order.id));
    }

    Ok(())
}

/// Replaces an order's tender legs wholesale.
///
/// Updates are overwrite, not additive: one row per method per order, so
/// resubmitting a draft never accretes duplicate legs.
pub async fn replace_payments(
    conn: &mut SqliteConnection,
    order_id: &str,
    payments: &[Payment],
) -> DbResult<()> {
    sqlx::query("DELETE FROM payments WHERE order_id = ?1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    for payment in payments {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, method, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Gets all payments for an order.
pub async fn payments_for_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, order_id, method, amount_cents, created_at
        FROM payments
        WHERE order_id = ?1
        ORDER BY created_at
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

/// Sum of DINHEIRO payments across a register's completed, active orders.
///
/// This is the sales component of the drawer's expected cash at close.
pub async fn cash_total_for_register(
    conn: &mut SqliteConnection,
    register_id: &str,
) -> DbResult<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(p.amount_cents)
        FROM payments p
        INNER JOIN orders o ON o.id = p.order_id
        WHERE o.cash_register_id = ?1
          AND o.status = 'completed'
          AND o.is_active = 1
          AND p.method = 'dinheiro'
        "#,
    )
    .bind(register_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(total.unwrap_or(0))
}

/// Per-method payment totals across a register's completed, active orders.
pub async fn method_totals_for_register(
    conn: &mut SqliteConnection,
    register_id: &str,
) -> DbResult<MethodTotals> {
    let rows: Vec<(PaymentMethod, i64)> = sqlx::query_as(
        r#"
        SELECT p.method, SUM(p.amount_cents)
        FROM payments p
        INNER JOIN orders o ON o.id = p.order_id
        WHERE o.cash_register_id = ?1
          AND o.status = 'completed'
          AND o.is_active = 1
        GROUP BY p.method
        "#,
    )
    .bind(register_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut totals = MethodTotals::default();
    for (method, amount_cents) in rows {
        totals.add(method, amount_cents);
    }

    Ok(totals)
}

/// Quantity of a variant already returned against an order, across all
/// prior return calls.
pub async fn returned_quantity(
    conn: &mut SqliteConnection,
    order_id: &str,
    variant_id: &str,
) -> DbResult<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(quantity)
        FROM order_returns
        WHERE order_id = ?1 AND variant_id = ?2
        "#,
    )
    .bind(order_id)
    .bind(variant_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(total.unwrap_or(0))
}

/// Records a per-variant return.
pub async fn insert_return(conn: &mut SqliteConnection, ret: &OrderReturn) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_returns (
            id, order_id, variant_id, quantity, restocked, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&ret.id)
    .bind(&ret.order_id)
    .bind(&ret.variant_id)
    .bind(ret.quantity)
    .bind(ret.restocked)
    .bind(ret.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order reads and standalone writes.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        order_by_id(&mut conn, id).await
    }

    /// Gets all payments for an order.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        payments_for_order(&mut conn, order_id).await
    }

    /// Lists the active orders of a register session, newest first.
    pub async fn list_for_register(&self, register_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE cash_register_id = ?1 AND is_active = 1 \
             ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(register_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Soft-deletes an order. The row and its payment history survive for
    /// register reconciliation of past sessions.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders SET
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
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Return records for an order.
    pub async fn returns_for_order(&self, order_id: &str) -> DbResult<Vec<OrderReturn>> {
        let returns = sqlx::query_as::<_, OrderReturn>(
            r#"
            SELECT id, order_id, variant_id, quantity, restocked, created_at
            FROM order_returns
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }
}
