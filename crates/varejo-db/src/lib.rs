//! # varejo-db: Database Layer for Varejo POS
//!
//! This crate provides database access and the transactional operation
//! services for the Varejo POS system. It uses SQLite for local storage
//! with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                      Varejo POS Data Flow                          │
//! │                                                                    │
//! │  External caller (cashier front end, out of scope)                 │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  ┌──────────────────────────────────────────────────────────────┐  │
//! │  │                   varejo-db (THIS CRATE)                     │  │
//! │  │                                                              │  │
//! │  │  ┌────────────┐   ┌──────────────┐   ┌───────────────────┐  │  │
//! │  │  │  Database  │   │ Repositories │   │     Services      │  │  │
//! │  │  │ (pool.rs)  │◄──│ product order│◄──│ checkout register │  │  │
//! │  │  │ SqlitePool │   │ register ... │   │ restock returns.. │  │  │
//! │  │  └────────────┘   └──────────────┘   └───────────────────┘  │  │
//! │  │                                                              │  │
//! │  │  Each service operation = ONE transaction                    │  │
//! │  └──────────────────────────────────────────────────────────────┘  │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  SQLite database (WAL mode, foreign keys on)                       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Row mapping and statement-level operations
//! - [`service`] - Atomic operations (checkout, register, restock, returns,
//!   receivables)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use varejo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/varejo.db")).await?;
//!
//! let register = db.register_service().open(5000, true).await?;
//! let order = db.checkout().submit_order(&cashier, draft).await?;
//! let report = db.register_service().report().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use service::{ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::receivable::ReceivableRepository;
pub use repository::register::RegisterRepository;
pub use repository::treasury::TreasuryRepository;

// Service re-exports
pub use service::checkout::CheckoutService;
pub use service::receivable::ReceivableService;
pub use service::register::RegisterService;
pub use service::restock::RestockService;
pub use service::returns::ReturnsService;
