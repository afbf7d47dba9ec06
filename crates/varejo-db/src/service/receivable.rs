//! # Receivable Service
//!
//! Crediário collection. Marking a receivable paid is the only point at
//! which a CREDIARIO sale becomes recognized cash inflow - deferred
//! relative to PIX/CARTAO, which the checkout recognizes at settlement.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::repository::{receivable, treasury};
use crate::service::{ServiceError, ServiceResult};
use varejo_core::{
    AccountReceivable, CoreError, ReceivableStatus, TreasuryCategory, TreasuryDirection,
};

/// Receivable collection operations.
#[derive(Debug, Clone)]
pub struct ReceivableService {
    pool: SqlitePool,
}

impl ReceivableService {
    /// Creates a new ReceivableService.
    pub fn new(pool: SqlitePool) -> Self {
        ReceivableService { pool }
    }

    /// Collects a receivable: PENDING/OVERDUE → PAID plus a treasury IN
    /// `receivable_settled` entry, in one transaction.
    ///
    /// A late payment is still a payment, so OVERDUE collects the same way
    /// PENDING does. An already-PAID receivable fails instead of
    /// double-booking the inflow.
    pub async fn mark_paid(&self, receivable_id: &str) -> ServiceResult<AccountReceivable> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = receivable::receivable_by_id(&mut tx, receivable_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Receivable", receivable_id))?;

        let settled = receivable::try_mark_paid(&mut tx, receivable_id, now).await?;
        if !settled {
            return Err(ServiceError::Core(CoreError::ReceivableAlreadySettled {
                id: receivable_id.to_string(),
                status: row.status,
            }));
        }

        let entry = treasury::entry(
            format!("Crediário collected for order {}", row.order_id),
            row.amount(),
            TreasuryDirection::In,
            TreasuryCategory::ReceivableSettled,
            now,
        );
        treasury::insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            receivable_id = %receivable_id,
            order_id = %row.order_id,
            amount = %row.amount_cents,
            "Receivable collected"
        );

        Ok(AccountReceivable {
            status: ReceivableStatus::Paid,
            paid_at: Some(now),
            ..row
        })
    }
}
