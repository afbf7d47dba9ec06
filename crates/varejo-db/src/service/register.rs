//! # Cash Register Service
//!
//! The register lifecycle state machine: CLOSED → OPEN → CLOSED → …
//!
//! ## One Trading Day
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  OPEN(initial = 50.00, confirm_withdrawal = true)                │
//! │    previous retained float: 0                                    │
//! │    ledger: OUT supply_pdv 50.00 (funded from the safe)           │
//! │       │                                                          │
//! │       ▼  ... sales accumulate on the register ...                │
//! │       │                                                          │
//! │  CLOSE(counted = 180.00, transfer = 150.00)                      │
//! │    expected = 50.00 + cash sales 131.00 = 181.00                 │
//! │    difference = -1.00 → ledger: OUT breakage 1.00                │
//! │    ledger: IN internal_transfer 150.00 (sangria to the safe)     │
//! │    retained = 30.00 → next session's suggested float             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The difference entry is an operational error signal; the transfer entry
//! is an intentional movement. Keeping them separate lets the retained float
//! reflect only what is physically left in the drawer while the ledger still
//! records every cash movement exactly once.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbError;
use crate::repository::{new_id, order, register, treasury};
use crate::service::{ServiceError, ServiceResult};
use varejo_core::validation::validate_cents;
use varejo_core::{
    CashRegister, CoreError, Money, RegisterReport, RegisterStatus, TreasuryCategory,
    TreasuryDirection, CASH_TOLERANCE_CENTS,
};

/// Register lifecycle operations. Open and close are single transactions.
#[derive(Debug, Clone)]
pub struct RegisterService {
    pool: SqlitePool,
}

impl RegisterService {
    /// Creates a new RegisterService.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterService { pool }
    }

    /// Opens a new register session.
    ///
    /// ## What This Does
    /// 1. Reads the previous session's retained float
    /// 2. Inserts the OPEN register; the partial unique index rejects a
    ///    second OPEN row, which surfaces as [`CoreError::RegisterAlreadyOpen`]
    /// 3. When the float exceeds the retained balance and the cashier
    ///    confirmed the difference came from the safe, records an OUT
    ///    `supply_pdv` ledger entry for that difference
    ///
    /// No withdrawal entry is created without confirmation, or when the
    /// float fits inside the retained balance.
    pub async fn open(
        &self,
        initial_cents: i64,
        confirm_withdrawal: bool,
    ) -> ServiceResult<CashRegister> {
        validate_cents("initial amount", initial_cents)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let previous_balance = register::last_closed_retained(&mut tx).await?;

        let new_register = CashRegister {
            id: new_id(),
            status: RegisterStatus::Open,
            initial_cents,
            final_cents: None,
            // Filled in at close; a fresh session has carried nothing yet.
            retained_cents: 0,
            opened_at: now,
            closed_at: None,
        };

        // The only unique constraint on cash_registers is the partial
        // single-open index, so any unique violation here is the conflict.
        match register::insert_register(&mut tx, &new_register).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation { .. }) => {
                return Err(ServiceError::Core(CoreError::RegisterAlreadyOpen));
            }
            Err(err) => return Err(err.into()),
        }

        let withdrawal_cents = initial_cents - previous_balance;
        if confirm_withdrawal && withdrawal_cents > 0 {
            let entry = treasury::entry(
                format!("Opening float withdrawal for register {}", new_register.id),
                Money::from_cents(withdrawal_cents),
                TreasuryDirection::Out,
                TreasuryCategory::SupplyPdv,
                now,
            );
            treasury::insert_entry(&mut tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            register_id = %new_register.id,
            initial = %initial_cents,
            previous_balance = %previous_balance,
            "Register opened"
        );

        Ok(new_register)
    }

    /// Closes the open register session.
    ///
    /// ## What This Does
    /// 1. Computes `expected = initial + Σ DINHEIRO payments` over this
    ///    register's completed orders
    /// 2. Books any count difference beyond one cent as `breakage` (short)
    ///    or `surplus` (over)
    /// 3. Books the transfer to the safe as `internal_transfer`
    /// 4. Retains `counted − transfer` as the next session's suggested float
    ///
    /// ## Errors
    /// - [`CoreError::NoOpenRegister`] - nothing to close
    /// - [`CoreError::TransferExceedsCounted`] - cannot move more cash to
    ///   the safe than is physically in the drawer
    pub async fn close(
        &self,
        counted_cents: i64,
        transfer_cents: i64,
    ) -> ServiceResult<CashRegister> {
        validate_cents("counted cash", counted_cents)?;
        validate_cents("transfer amount", transfer_cents)?;

        if transfer_cents > counted_cents {
            return Err(ServiceError::Core(CoreError::TransferExceedsCounted {
                counted_cents,
                transfer_cents,
            }));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let open = register::open_register(&mut tx)
            .await?
            .ok_or(CoreError::NoOpenRegister)?;

        let cash_sales = order::cash_total_for_register(&mut tx, &open.id).await?;
        let expected_cents = open.initial_cents + cash_sales;
        let difference = counted_cents - expected_cents;

        if difference.abs() > CASH_TOLERANCE_CENTS {
            let (direction, category, label) = if difference < 0 {
                (
                    TreasuryDirection::Out,
                    TreasuryCategory::Breakage,
                    "shortage",
                )
            } else {
                (TreasuryDirection::In, TreasuryCategory::Surplus, "surplus")
            };

            warn!(
                register_id = %open.id,
                expected = %expected_cents,
                counted = %counted_cents,
                difference = %difference,
                "Drawer count differs from expected cash"
            );

            let entry = treasury::entry(
                format!("Cash {label} at close of register {}", open.id),
                Money::from_cents(difference.abs()),
                direction,
                category,
                now,
            );
            treasury::insert_entry(&mut tx, &entry).await?;
        }

        if transfer_cents > 0 {
            let entry = treasury::entry(
                format!("Drawer transfer to safe from register {}", open.id),
                Money::from_cents(transfer_cents),
                TreasuryDirection::In,
                TreasuryCategory::InternalTransfer,
                now,
            );
            treasury::insert_entry(&mut tx, &entry).await?;
        }

        let retained_cents = counted_cents - transfer_cents;
        register::close_register(&mut tx, &open.id, counted_cents, retained_cents, now).await?;

        tx.commit().await?;

        info!(
            register_id = %open.id,
            expected = %expected_cents,
            counted = %counted_cents,
            retained = %retained_cents,
            "Register closed"
        );

        Ok(CashRegister {
            status: RegisterStatus::Closed,
            final_cents: Some(counted_cents),
            retained_cents,
            closed_at: Some(now),
            ..open
        })
    }

    /// Snapshot of the current register state.
    ///
    /// OPEN: per-method sale totals and the cash the drawer should hold.
    /// CLOSED: the float suggested for the next session.
    pub async fn report(&self) -> ServiceResult<RegisterReport> {
        let mut conn = self.pool.acquire().await?;

        if let Some(open) = register::open_register(&mut conn).await? {
            let totals = order::method_totals_for_register(&mut conn, &open.id).await?;
            let expected_cash_cents = open.initial_cents + totals.dinheiro_cents;

            Ok(RegisterReport::Open {
                register: open,
                totals,
                expected_cash_cents,
            })
        } else {
            let suggested_float_cents = register::last_closed_retained(&mut conn).await?;

            Ok(RegisterReport::Closed {
                suggested_float_cents,
            })
        }
    }
}
