//! # Accounts Receivable Repository
//!
//! Database operations for crediário receivables.
//!
//! A receivable exists iff its order carries a CREDIARIO payment leg; the
//! checkout service creates and replaces them in the settlement transaction,
//! and the receivable service collects them.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use varejo_core::AccountReceivable;

const RECEIVABLE_COLUMNS: &str =
    "id, order_id, customer_id, amount_cents, due_date, status, created_at, paid_at";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches a receivable by id.
pub async fn receivable_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<AccountReceivable>> {
    let sql = format!("SELECT {RECEIVABLE_COLUMNS} FROM accounts_receivable WHERE id = ?1");
    let receivable = sqlx::query_as::<_, AccountReceivable>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(receivable)
}

/// Inserts a receivable row.
pub async fn insert_receivable(
    conn: &mut SqliteConnection,
    receivable: &AccountReceivable,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts_receivable (
            id, order_id, customer_id, amount_cents, due_date, status,
            created_at, paid_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&receivable.id)
    .bind(&receivable.order_id)
    .bind(&receivable.customer_id)
    .bind(receivable.amount_cents)
    .bind(receivable.due_date)
    .bind(receivable.status)
    .bind(receivable.created_at)
    .bind(receivable.paid_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes an order's receivables, for replace-on-update of a pending
/// order's tender plan. Settled receivables are never touched: the checkout
/// service only replaces payments before the settlement transition.
pub async fn delete_for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM accounts_receivable WHERE order_id = ?1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Transitions PENDING/OVERDUE → PAID. Returns `false` when the receivable
/// was already settled (guard and update are one statement).
pub async fn try_mark_paid(
    conn: &mut SqliteConnection,
    id: &str,
    paid_at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE accounts_receivable SET
            status = 'paid',
            paid_at = ?2
        WHERE id = ?1 AND status IN ('pending', 'overdue')
        "#,
    )
    .bind(id)
    .bind(paid_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for receivable reads and the overdue sweep.
#[derive(Debug, Clone)]
pub struct ReceivableRepository {
    pool: SqlitePool,
}

impl ReceivableRepository {
    /// Creates a new ReceivableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceivableRepository { pool }
    }

    /// Gets a receivable by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<AccountReceivable>> {
        let mut conn = self.pool.acquire().await?;
        receivable_by_id(&mut conn, id).await
    }

    /// Receivables spawned by an order.
    pub async fn for_order(&self, order_id: &str) -> DbResult<Vec<AccountReceivable>> {
        let sql = format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM accounts_receivable \
             WHERE order_id = ?1 ORDER BY created_at"
        );
        let receivables = sqlx::query_as::<_, AccountReceivable>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(receivables)
    }

    /// Uncollected receivables (PENDING or OVERDUE), soonest due first.
    pub async fn list_open(&self, limit: u32) -> DbResult<Vec<AccountReceivable>> {
        let sql = format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM accounts_receivable \
             WHERE status IN ('pending', 'overdue') \
             ORDER BY due_date ASC LIMIT ?1"
        );
        let receivables = sqlx::query_as::<_, AccountReceivable>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(receivables)
    }

    /// Flips PENDING receivables past their due date to OVERDUE. Returns the
    /// number of rows flipped. Report-time hygiene; no ledger effect.
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts_receivable SET
                status = 'overdue'
            WHERE status = 'pending' AND due_date < ?1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
