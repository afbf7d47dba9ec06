//! # Cash Register Repository
//!
//! Database operations for register sessions.
//!
//! The single-open invariant lives in the schema: a partial unique index on
//! `status WHERE status = 'open'` makes the second concurrent open fail its
//! INSERT, whatever interleaving the two transactions take. Registers are
//! never deleted; a closed session is the audit trail of one trading day.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use varejo_core::CashRegister;

const REGISTER_COLUMNS: &str =
    "id, status, initial_cents, final_cents, retained_cents, opened_at, closed_at";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Fetches the currently OPEN register, if any.
pub async fn open_register(conn: &mut SqliteConnection) -> DbResult<Option<CashRegister>> {
    let sql = format!("SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE status = 'open'");
    let register = sqlx::query_as::<_, CashRegister>(&sql)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(register)
}

/// Retained float of the most recently closed register (0 if none).
///
/// This is the suggested opening float for the next session.
pub async fn last_closed_retained(conn: &mut SqliteConnection) -> DbResult<i64> {
    let retained: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT retained_cents
        FROM cash_registers
        WHERE status = 'closed'
        ORDER BY closed_at DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(retained.unwrap_or(0))
}

/// Inserts a register row.
///
/// Fails with a unique violation on `cash_registers.status` when another
/// OPEN register exists; the caller maps that to a conflict.
pub async fn insert_register(conn: &mut SqliteConnection, register: &CashRegister) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cash_registers (
            id, status, initial_cents, final_cents, retained_cents,
            opened_at, closed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&register.id)
    .bind(register.status)
    .bind(register.initial_cents)
    .bind(register.final_cents)
    .bind(register.retained_cents)
    .bind(register.opened_at)
    .bind(register.closed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Transitions an OPEN register to CLOSED, recording the count and the
/// retained float. Guarded on `status = 'open'` so a double close is a
/// no-op reported as not found.
pub async fn close_register(
    conn: &mut SqliteConnection,
    id: &str,
    final_cents: i64,
    retained_cents: i64,
    closed_at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE cash_registers SET
            status = 'closed',
            final_cents = ?2,
            retained_cents = ?3,
            closed_at = ?4
        WHERE id = ?1 AND status = 'open'
        "#,
    )
    .bind(id)
    .bind(final_cents)
    .bind(retained_cents)
    .bind(closed_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Open register", id));
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for register session reads.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Gets the currently OPEN register, if any.
    pub async fn get_open(&self) -> DbResult<Option<CashRegister>> {
        let mut conn = self.pool.acquire().await?;
        open_register(&mut conn).await
    }

    /// Gets a register by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegister>> {
        let sql = format!("SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?1");
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// Lists register sessions, most recent first.
    pub async fn list_sessions(&self, limit: u32) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers \
             ORDER BY opened_at DESC LIMIT ?1"
        );
        let registers = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(registers)
    }
}
