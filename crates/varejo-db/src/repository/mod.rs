//! # Repository Implementations
//!
//! One repository per aggregate. Each repository struct owns a pool clone
//! for standalone reads and single-statement writes; the module-level
//! functions take `&mut SqliteConnection` so the service layer can compose
//! them inside one transaction.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Service (one transaction)                                       │
//! │      let mut tx = pool.begin().await?;                           │
//! │      order::insert_order(&mut tx, &order).await?;                │
//! │      product::try_decrement_stock(&mut tx, ...).await?;          │
//! │      treasury::insert_entry(&mut tx, &entry).await?;             │
//! │      tx.commit().await?;                                         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod order;
pub mod product;
pub mod receivable;
pub mod register;
pub mod treasury;

use uuid::Uuid;

/// Generates a new UUID v4 entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
