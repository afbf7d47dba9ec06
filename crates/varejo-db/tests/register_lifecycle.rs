//! Register lifecycle integration tests: open/close alternation, the
//! single-open invariant, drawer reconciliation, and the retained float.

use varejo_core::{
    Cashier, CoreError, OrderDraft, OrderItem, OrderStatus, PaymentDraft, PaymentMethod,
    RegisterReport, RestockTarget, TreasuryCategory,
};
use varejo_db::{Database, DbConfig};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn cashier() -> Cashier {
    Cashier {
        id: "cashier-1".to_string(),
        max_discount_bps: 1000,
    }
}

/// Seeds one variant with stock and returns it.
async fn seeded_variant(db: &Database, price_cents: i64, stock: i64) -> varejo_core::ProductVariant {
    let product = db.products().create_product("Camiseta Básica", None).await.unwrap();
    db.restock()
        .restock(
            RestockTarget::NewVariant {
                product_id: product.id.clone(),
                sku: "CAM-001-M".to_string(),
                name: "Camiseta Básica M".to_string(),
                price_cents,
                min_stock: 0,
            },
            stock,
            price_cents / 2,
        )
        .await
        .unwrap()
}

fn cash_sale(variant: &varejo_core::ProductVariant, quantity: i64) -> OrderDraft {
    OrderDraft {
        order_id: None,
        customer_id: None,
        items: vec![OrderItem {
            variant_id: variant.id.clone(),
            name: variant.name.clone(),
            quantity,
            unit_price_cents: variant.price_cents,
        }],
        payments: vec![PaymentDraft::new(
            PaymentMethod::Dinheiro,
            variant.price_cents * quantity,
        )],
        discount_bps: 0,
        target_status: OrderStatus::Completed,
    }
}

/// Opening with no prior register and a confirmed withdrawal books exactly
/// one supply entry for the full float.
#[tokio::test]
async fn open_with_confirmed_withdrawal_books_supply() {
    let db = test_db().await;

    let register = db.register_service().open(5000, true).await.unwrap();
    assert_eq!(register.initial_cents, 5000);
    assert_eq!(register.retained_cents, 0);

    let entries = db
        .treasury()
        .list_by_category(TreasuryCategory::SupplyPdv, 10)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount_cents, 5000);
}

#[tokio::test]
async fn open_without_confirmation_books_nothing() {
    let db = test_db().await;

    db.register_service().open(5000, false).await.unwrap();

    let entries = db
        .treasury()
        .list_by_category(TreasuryCategory::SupplyPdv, 10)
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn second_open_is_a_conflict() {
    let db = test_db().await;

    db.register_service().open(5000, false).await.unwrap();
    let err = db.register_service().open(3000, false).await.unwrap_err();

    assert!(matches!(
        err.as_core(),
        Some(CoreError::RegisterAlreadyOpen)
    ));
}

/// Two cashiers racing to open: exactly one wins, whatever the interleaving.
#[tokio::test]
async fn concurrent_opens_yield_exactly_one_register() {
    let db = test_db().await;
    let service_a = db.register_service();
    let service_b = db.register_service();

    let (a, b) = tokio::join!(service_a.open(5000, false), service_b.open(4000, false));

    assert_eq!(
        [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
        1,
        "exactly one open must succeed"
    );
}

#[tokio::test]
async fn close_without_open_register_fails() {
    let db = test_db().await;

    let err = db.register_service().close(1000, 0).await.unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::NoOpenRegister)));
}

/// Cannot move more cash to the safe than was physically counted.
#[tokio::test]
async fn close_transfer_exceeding_counted_fails() {
    let db = test_db().await;
    db.register_service().open(5000, false).await.unwrap();

    let err = db.register_service().close(10000, 15000).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::TransferExceedsCounted {
            counted_cents: 10000,
            transfer_cents: 15000
        })
    ));
}

/// Full day: float 50.00, one cash sale of 30.00, drawer counted 75.00
/// (5.00 short), 50.00 transferred to the safe. Books one breakage entry
/// and one transfer entry, retains 25.00 for the next session.
#[tokio::test]
async fn close_reconciles_breakage_transfer_and_retained_float() {
    let db = test_db().await;
    let variant = seeded_variant(&db, 3000, 10).await;

    db.register_service().open(5000, false).await.unwrap();
    db.checkout()
        .submit_order(&cashier(), cash_sale(&variant, 1))
        .await
        .unwrap();

    let closed = db.register_service().close(7500, 5000).await.unwrap();
    assert_eq!(closed.final_cents, Some(7500));
    assert_eq!(closed.retained_cents, 2500);

    let breakage = db
        .treasury()
        .list_by_category(TreasuryCategory::Breakage, 10)
        .await
        .unwrap();
    assert_eq!(breakage.len(), 1);
    assert_eq!(breakage[0].amount_cents, 500);

    let transfers = db
        .treasury()
        .list_by_category(TreasuryCategory::InternalTransfer, 10)
        .await
        .unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].amount_cents, 5000);

    // The retained float becomes the next session's suggestion.
    match db.register_service().report().await.unwrap() {
        RegisterReport::Closed {
            suggested_float_cents,
        } => assert_eq!(suggested_float_cents, 2500),
        RegisterReport::Open { .. } => panic!("no register should be open"),
    }

    // Ledger reconciles: transfer IN 50.00, breakage OUT 5.00, and the
    // seeding restock expense OUT 150.00 (10 units at half of 30.00).
    let balance = db.treasury().balance().await.unwrap();
    assert_eq!(balance, 5000 - 500 - 15000);
}

/// A drawer counted over books a surplus entry instead.
#[tokio::test]
async fn close_counted_over_books_surplus() {
    let db = test_db().await;
    db.register_service().open(5000, false).await.unwrap();

    db.register_service().close(5300, 0).await.unwrap();

    let surplus = db
        .treasury()
        .list_by_category(TreasuryCategory::Surplus, 10)
        .await
        .unwrap();
    assert_eq!(surplus.len(), 1);
    assert_eq!(surplus[0].amount_cents, 300);
}

/// A one-cent count difference is tolerated, not booked.
#[tokio::test]
async fn close_within_tolerance_books_no_difference() {
    let db = test_db().await;
    db.register_service().open(5000, false).await.unwrap();

    db.register_service().close(5001, 0).await.unwrap();

    let surplus = db
        .treasury()
        .list_by_category(TreasuryCategory::Surplus, 10)
        .await
        .unwrap();
    let breakage = db
        .treasury()
        .list_by_category(TreasuryCategory::Breakage, 10)
        .await
        .unwrap();
    assert!(surplus.is_empty());
    assert!(breakage.is_empty());
}

/// Reopening after a close: the float up to the retained balance needs no
/// withdrawal entry; only the topped-up difference is booked.
#[tokio::test]
async fn reopen_books_only_the_topped_up_difference() {
    let db = test_db().await;
    db.register_service().open(5000, false).await.unwrap();
    db.register_service().close(5000, 3000).await.unwrap();
    // Retained 2000; reopening with 4500 tops up 2500 from the safe.
    db.register_service().open(4500, true).await.unwrap();

    let supply = db
        .treasury()
        .list_by_category(TreasuryCategory::SupplyPdv, 10)
        .await
        .unwrap();
    assert_eq!(supply.len(), 1);
    assert_eq!(supply[0].amount_cents, 2500);
}

/// The open-register report aggregates per-method totals and expected cash.
#[tokio::test]
async fn open_report_aggregates_method_totals() {
    let db = test_db().await;
    let variant = seeded_variant(&db, 4000, 10).await;

    db.register_service().open(2000, false).await.unwrap();

    // One cash sale, one split card sale.
    db.checkout()
        .submit_order(&cashier(), cash_sale(&variant, 1))
        .await
        .unwrap();

    let mut split = cash_sale(&variant, 2);
    split.payments = vec![
        PaymentDraft::new(PaymentMethod::Dinheiro, 3000),
        PaymentDraft::new(PaymentMethod::Cartao, 5000),
    ];
    db.checkout().submit_order(&cashier(), split).await.unwrap();

    match db.register_service().report().await.unwrap() {
        RegisterReport::Open {
            totals,
            expected_cash_cents,
            ..
        } => {
            assert_eq!(totals.dinheiro_cents, 7000);
            assert_eq!(totals.cartao_cents, 5000);
            assert_eq!(expected_cash_cents, 2000 + 7000);
        }
        RegisterReport::Closed { .. } => panic!("register should be open"),
    }
}
