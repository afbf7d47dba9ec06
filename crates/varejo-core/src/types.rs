//! # Domain Types
//!
//! Core domain types used throughout Varejo POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Domain Types                              │
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────────┐    │
//! │  │   Product    │  │    Order     │  │   CashRegister      │    │
//! │  │ ──────────── │  │ ──────────── │  │ ─────────────────── │    │
//! │  │ id (UUID)    │  │ id (UUID)    │  │ id (UUID)           │    │
//! │  │ cost_price   │  │ status       │  │ status OPEN|CLOSED  │    │
//! │  │ (wavg)       │  │ items_json   │  │ initial/retained    │    │
//! │  └──────┬───────┘  │ total_cents  │  └─────────────────────┘    │
//! │         │          └──────┬───────┘                              │
//! │  ┌──────▼───────┐  ┌──────▼───────┐  ┌─────────────────────┐    │
//! │  │ProductVariant│  │   Payment    │  │ TreasuryTransaction │    │
//! │  │ sku, stock   │  │ method,      │  │ direction IN|OUT    │    │
//! │  │ min_stock    │  │ amount_cents │  │ category, amount    │    │
//! │  └──────────────┘  └──────────────┘  └─────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (variant `sku`) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product & Variants
// =============================================================================

/// A product: the cost-basis unit of the catalog.
///
/// `cost_price_cents` is a **weighted average across all of the product's
/// variants' combined stock**, recalculated on every restock. It is only
/// meaningful while total stock is positive; a restock from zero total stock
/// resets it to the incoming unit cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Weighted-average unit cost in cents, across all variants.
    pub cost_price_cents: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the weighted-average cost as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }
}

/// A sellable unit: one size/color of a product.
///
/// Variants with movement history are never deleted - only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,

    /// Stock Keeping Unit - business identifier, unique across the catalog.
    pub sku: String,

    /// Variant display name (e.g. "Camiseta Azul M").
    pub name: String,

    /// Sale price in cents.
    pub price_cents: i64,

    /// Current stock level. Non-negative in steady state.
    pub stock_quantity: i64,

    /// Restock alert threshold.
    pub min_stock: i64,

    /// Whether variant is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Returns the sale price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when stock has fallen to or below the alert threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock entering the store (restock, restocked return).
    In,
    /// Stock leaving the store (sale).
    Out,
}

/// Append-only inventory log entry.
///
/// Every stock mutation writes one of these in the same transaction, with a
/// reason naming the operation (and the order id for sale/return movements).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub variant_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Recorded but not settled; no stock or ledger effects yet.
    Pending,
    /// Settled. Stock was deducted exactly once at this transition.
    Completed,
    /// Abandoned before settlement.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a tender leg was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash. Reconciled against the drawer at register close.
    Dinheiro,
    /// Card on an external terminal. Recognized in the ledger at settlement.
    Cartao,
    /// Instant transfer. Recognized in the ledger at settlement.
    Pix,
    /// Store-financed deferred payment. Recognized only when the
    /// receivable is later marked paid.
    Crediario,
}

// =============================================================================
// Order
// =============================================================================

/// A sale or pending request.
///
/// Line items are stored as a JSON list in `items_json`; the typed shape is
/// [`OrderItem`] and is validated on ingestion, never trusted from callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,

    /// Customer from the external directory, when one was selected.
    pub customer_id: Option<String>,

    /// Register that was open when the order completed.
    pub cash_register_id: Option<String>,

    pub status: OrderStatus,

    /// JSON list of `OrderItem`.
    pub items_json: String,

    /// Total after discount, in cents.
    pub total_cents: i64,

    /// Applied discount in basis points (1000 = 10%).
    pub discount_bps: i64,

    /// Soft-delete flag.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Deserializes the line items.
    pub fn items(&self) -> Result<Vec<OrderItem>, serde_json::Error> {
        serde_json::from_str(&self.items_json)
    }
}

/// One line of an order. Price and name are frozen at sale time, so later
/// catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrderItem {
    pub variant_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl OrderItem {
    /// Returns the line total (unit price × quantity) as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents * self.quantity)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A persisted tender leg: one row per method per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,

    /// Amount in cents, after change adjustment for the cash leg.
    pub amount_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A tender leg as entered by the cashier, before normalization.
///
/// `due_date` only applies to crediário legs and defaults to
/// [`crate::CREDIARIO_DEFAULT_TERM_DAYS`] when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentDraft {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub due_date: Option<DateTime<Utc>>,
}

impl PaymentDraft {
    /// Convenience constructor for non-crediário legs.
    pub fn new(method: PaymentMethod, amount_cents: i64) -> Self {
        PaymentDraft {
            method,
            amount_cents,
            due_date: None,
        }
    }
}

// =============================================================================
// Accounts Receivable
// =============================================================================

/// Lifecycle of a crediário receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    Pending,
    Paid,
    Overdue,
}

/// A deferred-payment balance tied to a customer and an order.
///
/// Exists iff the order carries a CREDIARIO payment leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountReceivable {
    pub id: String,
    pub order_id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub due_date: DateTime<Utc>,
    pub status: ReceivableStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl AccountReceivable {
    /// Returns the receivable amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Register
// =============================================================================

/// Register session state. Strictly alternating: CLOSED → OPEN → CLOSED → …
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
}

/// One bounded trading session of the physical drawer.
///
/// At most one register may be OPEN at any time, system-wide. Registers are
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashRegister {
    pub id: String,
    pub status: RegisterStatus,

    /// Opening float placed in the drawer (fundo de troco), in cents.
    pub initial_cents: i64,

    /// Cash physically counted at close.
    pub final_cents: Option<i64>,

    /// Cash left in the drawer after close (counted − transfer); the next
    /// session's suggested opening float.
    pub retained_cents: i64,

    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashRegister {
    /// Returns the opening float as Money.
    #[inline]
    pub fn initial_amount(&self) -> Money {
        Money::from_cents(self.initial_cents)
    }

    /// Returns the retained float as Money.
    #[inline]
    pub fn retained_amount(&self) -> Money {
        Money::from_cents(self.retained_cents)
    }
}

/// Per-method sale totals for an open register session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MethodTotals {
    pub dinheiro_cents: i64,
    pub cartao_cents: i64,
    pub pix_cents: i64,
    pub crediario_cents: i64,
}

impl MethodTotals {
    /// Sum across all methods, in cents.
    pub fn total_cents(&self) -> i64 {
        self.dinheiro_cents + self.cartao_cents + self.pix_cents + self.crediario_cents
    }

    /// Adds an amount to the bucket for `method`.
    pub fn add(&mut self, method: PaymentMethod, amount_cents: i64) {
        match method {
            PaymentMethod::Dinheiro => self.dinheiro_cents += amount_cents,
            PaymentMethod::Cartao => self.cartao_cents += amount_cents,
            PaymentMethod::Pix => self.pix_cents += amount_cents,
            PaymentMethod::Crediario => self.crediario_cents += amount_cents,
        }
    }
}

/// Snapshot returned by the register status operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum RegisterReport {
    /// A register is open: sales so far and the cash the drawer should hold.
    Open {
        register: CashRegister,
        totals: MethodTotals,
        expected_cash_cents: i64,
    },
    /// No register is open: the float suggested for the next session.
    Closed { suggested_float_cents: i64 },
}

// =============================================================================
// Treasury Ledger
// =============================================================================

/// Direction of a treasury movement. Amounts are always positive; the
/// direction carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TreasuryDirection {
    In,
    Out,
}

/// Why a treasury movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TreasuryCategory {
    /// Withdrawal from the safe to fund a register opening float.
    SupplyPdv,
    /// Drawer counted short at close (quebra de caixa).
    Breakage,
    /// Drawer counted over at close (sobra de caixa).
    Surplus,
    /// Cash moved from the drawer into the safe at close (sangria).
    InternalTransfer,
    /// PIX/card sale recognized at settlement time.
    DigitalSale,
    /// Stock purchase expense.
    Restock,
    /// Money returned to a customer.
    Refund,
    /// Crediário receivable collected.
    ReceivableSettled,
}

/// Append-only ledger row: the source of truth for money movement outside
/// direct sales bookkeeping. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TreasuryTransaction {
    pub id: String,
    pub description: String,

    /// Always positive; see [`TreasuryDirection`].
    pub amount_cents: i64,

    pub direction: TreasuryDirection,
    pub category: TreasuryCategory,
    pub entry_date: DateTime<Utc>,
}

impl TreasuryTransaction {
    /// Returns the entry amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Signed amount: positive for IN, negative for OUT.
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            TreasuryDirection::In => self.amount(),
            TreasuryDirection::Out => Money::zero() - self.amount(),
        }
    }
}

// =============================================================================
// Order Returns
// =============================================================================

/// Per-variant record of a (partial) return, used to enforce the cumulative
/// "never return more than was sold" rule across multiple return calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderReturn {
    pub id: String,
    pub order_id: String,
    pub variant_id: String,
    pub quantity: i64,
    pub restocked: bool,
    pub created_at: DateTime<Utc>,
}

/// One line of a return request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReturnItem {
    pub variant_id: String,
    pub quantity: i64,
}

// =============================================================================
// External Collaborators
// =============================================================================

/// The authenticated actor submitting a checkout.
///
/// Identity and authentication live outside this core; settlement only needs
/// the discount ceiling, re-validated server-side on every submission
/// (UI-time authorization state is ephemeral and never trusted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cashier {
    pub id: String,

    /// Seller-level discount ceiling in basis points. An owner override
    /// supplies a temporarily higher ceiling through the same field.
    pub max_discount_bps: u32,
}

/// Checkout request: create a new order or overwrite a pending one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrderDraft {
    /// When set, updates the existing order instead of creating one.
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub payments: Vec<PaymentDraft>,

    /// Requested discount in basis points, re-validated at settlement.
    pub discount_bps: u32,

    pub target_status: OrderStatus,
}

/// Target of a restock: an existing variant, or a brand-new variant created
/// at zero stock in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RestockTarget {
    Existing {
        variant_id: String,
    },
    NewVariant {
        product_id: String,
        sku: String,
        name: String,
        price_cents: i64,
        min_stock: i64,
    },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            variant_id: "v1".to_string(),
            name: "Camiseta Azul M".to_string(),
            quantity: 3,
            unit_price_cents: 4990,
        };
        assert_eq!(item.line_total().cents(), 14970);
    }

    #[test]
    fn test_order_items_round_trip() {
        let items = vec![OrderItem {
            variant_id: "v1".to_string(),
            name: "Camiseta Azul M".to_string(),
            quantity: 2,
            unit_price_cents: 4990,
        }];
        let order = Order {
            id: "o1".to_string(),
            customer_id: None,
            cash_register_id: None,
            status: OrderStatus::Pending,
            items_json: serde_json::to_string(&items).unwrap(),
            total_cents: 9980,
            discount_bps: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };
        assert_eq!(order.items().unwrap(), items);
    }

    #[test]
    fn test_method_totals_add() {
        let mut totals = MethodTotals::default();
        totals.add(PaymentMethod::Dinheiro, 5000);
        totals.add(PaymentMethod::Cartao, 3000);
        totals.add(PaymentMethod::Dinheiro, 1000);
        assert_eq!(totals.dinheiro_cents, 6000);
        assert_eq!(totals.cartao_cents, 3000);
        assert_eq!(totals.total_cents(), 9000);
    }

    #[test]
    fn test_treasury_signed_amount() {
        let entry = TreasuryTransaction {
            id: "t1".to_string(),
            description: "restock".to_string(),
            amount_cents: 500,
            direction: TreasuryDirection::Out,
            category: TreasuryCategory::Restock,
            entry_date: Utc::now(),
        };
        assert_eq!(entry.signed_amount().cents(), -500);
    }

    #[test]
    fn test_variant_low_stock() {
        let variant = ProductVariant {
            id: "v1".to_string(),
            product_id: "p1".to_string(),
            sku: "CAM-AZ-M".to_string(),
            name: "Camiseta Azul M".to_string(),
            price_cents: 4990,
            stock_quantity: 2,
            min_stock: 3,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(variant.is_low_stock());
    }
}
