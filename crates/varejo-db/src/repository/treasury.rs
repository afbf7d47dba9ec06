//! # Treasury Repository
//!
//! The append-only money-movement ledger.
//!
//! Rows are inserted and read, never updated or deleted; the schema has no
//! UPDATE path for this table and the repository exposes none. Amounts are
//! strictly positive with the sign carried by `direction`, so a ledger scan
//! reconciles by summing IN minus OUT.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use varejo_core::{Money, TreasuryCategory, TreasuryDirection, TreasuryTransaction};

use super::new_id;

const TREASURY_COLUMNS: &str = "id, description, amount_cents, direction, category, entry_date";

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Appends a ledger entry.
pub async fn insert_entry(
    conn: &mut SqliteConnection,
    entry: &TreasuryTransaction,
) -> DbResult<()> {
    debug!(
        id = %entry.id,
        category = ?entry.category,
        direction = ?entry.direction,
        amount = %entry.amount_cents,
        "Treasury entry"
    );

    sqlx::query(
        r#"
        INSERT INTO treasury_transactions (
            id, description, amount_cents, direction, category, entry_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.description)
    .bind(entry.amount_cents)
    .bind(entry.direction)
    .bind(entry.category)
    .bind(entry.entry_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Builds a ledger entry. Callers pass a strictly positive amount; the
/// direction carries the sign.
pub fn entry(
    description: impl Into<String>,
    amount: Money,
    direction: TreasuryDirection,
    category: TreasuryCategory,
    entry_date: DateTime<Utc>,
) -> TreasuryTransaction {
    TreasuryTransaction {
        id: new_id(),
        description: description.into(),
        amount_cents: amount.cents(),
        direction,
        category,
        entry_date,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for ledger reads and standalone appends.
#[derive(Debug, Clone)]
pub struct TreasuryRepository {
    pool: SqlitePool,
}

impl TreasuryRepository {
    /// Creates a new TreasuryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TreasuryRepository { pool }
    }

    /// Appends a ledger entry outside any service transaction (manual
    /// adjustments entered by the owner).
    pub async fn record(
        &self,
        description: &str,
        amount: Money,
        direction: TreasuryDirection,
        category: TreasuryCategory,
    ) -> DbResult<TreasuryTransaction> {
        let row = entry(description, amount, direction, category, Utc::now());

        let mut conn = self.pool.acquire().await?;
        insert_entry(&mut conn, &row).await?;

        Ok(row)
    }

    /// Lists entries in a category, newest first.
    pub async fn list_by_category(
        &self,
        category: TreasuryCategory,
        limit: u32,
    ) -> DbResult<Vec<TreasuryTransaction>> {
        let sql = format!(
            "SELECT {TREASURY_COLUMNS} FROM treasury_transactions \
             WHERE category = ?1 ORDER BY entry_date DESC LIMIT ?2"
        );
        let entries = sqlx::query_as::<_, TreasuryTransaction>(&sql)
            .bind(category)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Lists entries in a date window, oldest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<TreasuryTransaction>> {
        let sql = format!(
            "SELECT {TREASURY_COLUMNS} FROM treasury_transactions \
             WHERE entry_date >= ?1 AND entry_date <= ?2 ORDER BY entry_date"
        );
        let entries = sqlx::query_as::<_, TreasuryTransaction>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Net ledger balance in cents: Σ IN − Σ OUT.
    pub async fn balance(&self) -> DbResult<i64> {
        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(CASE WHEN direction = 'in' THEN amount_cents
                            ELSE -amount_cents END)
            FROM treasury_transactions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(balance.unwrap_or(0))
    }
}
