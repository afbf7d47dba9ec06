//! # Operation Services
//!
//! The atomic operations the core exposes to external callers. Each public
//! service method executes as a **single transaction**: every read that
//! informs a decision (current stock, current register, current weighted
//! cost) and every write that follows happens inside one
//! `pool.begin()` … `tx.commit()` bracket.
//!
//! A failed operation rolls back completely - partial application (payments
//! persisted but stock not deducted) is never an observable outcome. The
//! services never auto-retry a failed financial write.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  register ─► open / close / report                               │
//! │  checkout ─► submit_order (settlement)                           │
//! │  restock  ─► weighted-average recost + stock in                  │
//! │  returns  ─► partial return + refund                             │
//! │  receivable ─► mark_paid / collection                            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod checkout;
pub mod receivable;
pub mod register;
pub mod restock;
pub mod returns;

use thiserror::Error;

use crate::error::DbError;
use varejo_core::{CoreError, ValidationError};

/// Error at the operation boundary: a business rule violation or a database
/// failure. Either way the transaction rolled back.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

impl ServiceError {
    /// The business-rule error behind this failure, if it is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            ServiceError::Core(err) => Some(err),
            ServiceError::Db(_) => None,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
