//! Checkout settlement integration tests: split tender, change handling,
//! crediário receivables, digital-sale recognition, discount re-validation,
//! and the deduct-exactly-once stock invariant.

use varejo_core::{
    Cashier, CoreError, OrderDraft, OrderItem, OrderStatus, PaymentDraft, PaymentMethod,
    ProductVariant, RestockTarget, TreasuryCategory,
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

async fn seeded_variant(db: &Database, sku: &str, price_cents: i64, stock: i64) -> ProductVariant {
    let product = db
        .products()
        .create_product("Camiseta Básica", None)
        .await
        .unwrap();
    db.restock()
        .restock(
            RestockTarget::NewVariant {
                product_id: product.id.clone(),
                sku: sku.to_string(),
                name: format!("Camiseta Básica {sku}"),
                price_cents,
                min_stock: 0,
            },
            stock,
            price_cents / 2,
        )
        .await
        .unwrap()
}

fn draft(
    variant: &ProductVariant,
    quantity: i64,
    payments: Vec<PaymentDraft>,
    target_status: OrderStatus,
) -> OrderDraft {
    OrderDraft {
        order_id: None,
        customer_id: None,
        items: vec![OrderItem {
            variant_id: variant.id.clone(),
            name: variant.name.clone(),
            quantity,
            unit_price_cents: variant.price_cents,
        }],
        payments,
        discount_bps: 0,
        target_status,
    }
}

/// Order of 100.00 tendered 60.00 cash + 50.00 card: the persisted cash leg
/// shrinks to 50.00 and the card leg books one digital-sale entry.
#[tokio::test]
async fn change_comes_out_of_the_cash_leg() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 10000, 5).await;

    let order = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                1,
                vec![
                    PaymentDraft::new(PaymentMethod::Dinheiro, 6000),
                    PaymentDraft::new(PaymentMethod::Cartao, 5000),
                ],
                OrderStatus::Completed,
            ),
        )
        .await
        .unwrap();

    let payments = db.orders().get_payments(&order.id).await.unwrap();
    assert_eq!(payments.len(), 2);

    let cash = payments
        .iter()
        .find(|p| p.method == PaymentMethod::Dinheiro)
        .unwrap();
    assert_eq!(cash.amount_cents, 5000);

    let paid: i64 = payments.iter().map(|p| p.amount_cents).sum();
    assert_eq!(paid, order.total_cents);

    let digital = db
        .treasury()
        .list_by_category(TreasuryCategory::DigitalSale, 10)
        .await
        .unwrap();
    assert_eq!(digital.len(), 1);
    assert_eq!(digital[0].amount_cents, 5000);
}

#[tokio::test]
async fn change_without_cash_tender_fails() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 10000, 5).await;

    let err = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                1,
                vec![PaymentDraft::new(PaymentMethod::Cartao, 11000)],
                OrderStatus::Completed,
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_core(),
        Some(CoreError::ChangeWithoutCashTender { .. })
    ));
}

#[tokio::test]
async fn under_tendered_completion_fails() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 10000, 5).await;

    let err = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                1,
                vec![PaymentDraft::new(PaymentMethod::Pix, 9000)],
                OrderStatus::Completed,
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_core(),
        Some(CoreError::PaymentMismatch { .. })
    ));
}

/// Crediário with no selected customer is rejected before anything persists.
#[tokio::test]
async fn crediario_without_customer_fails() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 8000, 5).await;

    let err = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                1,
                vec![PaymentDraft::new(PaymentMethod::Crediario, 8000)],
                OrderStatus::Completed,
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_core(),
        Some(CoreError::CrediarioRequiresCustomer)
    ));

    // Nothing leaked out of the rolled-back transaction.
    let remaining = db.products().get_variant(&variant.id).await.unwrap().unwrap();
    assert_eq!(remaining.stock_quantity, 5);
}

/// Crediário settlement spawns a pending receivable; no ledger entry until
/// the receivable is collected.
#[tokio::test]
async fn crediario_spawns_receivable_and_defers_recognition() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 8000, 5).await;

    let mut request = draft(
        &variant,
        1,
        vec![PaymentDraft::new(PaymentMethod::Crediario, 8000)],
        OrderStatus::Completed,
    );
    request.customer_id = Some("customer-77".to_string());

    let order = db.checkout().submit_order(&cashier(), request).await.unwrap();

    let receivables = db.receivables().for_order(&order.id).await.unwrap();
    assert_eq!(receivables.len(), 1);
    assert_eq!(receivables[0].amount_cents, 8000);
    assert_eq!(receivables[0].customer_id, "customer-77");

    // Deferred: the sale itself is not yet recognized inflow.
    let settled = db
        .treasury()
        .list_by_category(TreasuryCategory::ReceivableSettled, 10)
        .await
        .unwrap();
    assert!(settled.is_empty());

    // Collection books the inflow exactly once.
    let paid = db
        .receivable_service()
        .mark_paid(&receivables[0].id)
        .await
        .unwrap();
    assert!(paid.paid_at.is_some());

    let settled = db
        .treasury()
        .list_by_category(TreasuryCategory::ReceivableSettled, 10)
        .await
        .unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].amount_cents, 8000);

    let err = db
        .receivable_service()
        .mark_paid(&receivables[0].id)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::ReceivableAlreadySettled { .. })
    ));
}

/// Re-submitting an already-completed order must not deduct stock again.
#[tokio::test]
async fn resubmitting_a_completed_order_is_idempotent() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 5000, 10).await;

    let order = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                2,
                vec![PaymentDraft::new(PaymentMethod::Dinheiro, 10000)],
                OrderStatus::Completed,
            ),
        )
        .await
        .unwrap();

    let after_first = db.products().get_variant(&variant.id).await.unwrap().unwrap();
    assert_eq!(after_first.stock_quantity, 8);

    // Same order id, same completed target.
    let mut resubmit = draft(
        &variant,
        2,
        vec![PaymentDraft::new(PaymentMethod::Dinheiro, 10000)],
        OrderStatus::Completed,
    );
    resubmit.order_id = Some(order.id.clone());
    db.checkout().submit_order(&cashier(), resubmit).await.unwrap();

    let after_second = db.products().get_variant(&variant.id).await.unwrap().unwrap();
    assert_eq!(after_second.stock_quantity, 8, "stock must not move twice");

    // Ledger also untouched: no second digital/cash side effects.
    let payments = db.orders().get_payments(&order.id).await.unwrap();
    assert_eq!(payments.len(), 1);
}

/// Completing a pending order deducts stock at the transition, not before.
#[tokio::test]
async fn pending_to_completed_deducts_at_the_transition() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 5000, 10).await;

    let pending = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                2,
                vec![PaymentDraft::new(PaymentMethod::Dinheiro, 4000)],
                OrderStatus::Pending,
            ),
        )
        .await
        .unwrap();

    let untouched = db.products().get_variant(&variant.id).await.unwrap().unwrap();
    assert_eq!(untouched.stock_quantity, 10);

    let mut completion = draft(
        &variant,
        2,
        vec![PaymentDraft::new(PaymentMethod::Dinheiro, 10000)],
        OrderStatus::Completed,
    );
    completion.order_id = Some(pending.id.clone());
    db.checkout().submit_order(&cashier(), completion).await.unwrap();

    let deducted = db.products().get_variant(&variant.id).await.unwrap().unwrap();
    assert_eq!(deducted.stock_quantity, 8);

    // Payments were replaced, not accreted.
    let payments = db.orders().get_payments(&pending.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount_cents, 10000);
}

/// Two completions racing for the last unit: exactly one succeeds and the
/// loser reports insufficient stock.
#[tokio::test]
async fn last_unit_race_admits_exactly_one_sale() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 5000, 1).await;

    let checkout_a = db.checkout();
    let checkout_b = db.checkout();
    let draft_a = draft(
        &variant,
        1,
        vec![PaymentDraft::new(PaymentMethod::Dinheiro, 5000)],
        OrderStatus::Completed,
    );
    let draft_b = draft(
        &variant,
        1,
        vec![PaymentDraft::new(PaymentMethod::Pix, 5000)],
        OrderStatus::Completed,
    );

    let cashier_a = cashier();
    let cashier_b = cashier();
    let (a, b) = tokio::join!(
        checkout_a.submit_order(&cashier_a, draft_a),
        checkout_b.submit_order(&cashier_b, draft_b)
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one completion may win the last unit");

    let loser = if a.is_err() {
        a.unwrap_err()
    } else {
        b.unwrap_err()
    };
    assert!(matches!(
        loser.as_core(),
        Some(CoreError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        })
    ));

    let drained = db.products().get_variant(&variant.id).await.unwrap().unwrap();
    assert_eq!(drained.stock_quantity, 0);
}

/// The settlement step re-validates the discount even when the UI claims it
/// was authorized.
#[tokio::test]
async fn discount_over_ceiling_blocks_settlement() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 10000, 5).await;

    let mut request = draft(
        &variant,
        1,
        vec![PaymentDraft::new(PaymentMethod::Dinheiro, 8000)],
        OrderStatus::Completed,
    );
    request.discount_bps = 2000; // 20% against a 10% ceiling

    let err = db.checkout().submit_order(&cashier(), request).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::DiscountOverCeiling {
            requested_bps: 2000,
            ceiling_bps: 1000
        })
    ));

    // A higher owner-override ceiling admits the same discount.
    let owner = Cashier {
        id: "owner".to_string(),
        max_discount_bps: 3000,
    };
    let mut request = draft(
        &variant,
        1,
        vec![PaymentDraft::new(PaymentMethod::Dinheiro, 8000)],
        OrderStatus::Completed,
    );
    request.discount_bps = 2000;

    let order = db.checkout().submit_order(&owner, request).await.unwrap();
    assert_eq!(order.total_cents, 8000);
}

/// A completed sale links to the open register session.
#[tokio::test]
async fn completed_order_links_to_the_open_register() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 5000, 5).await;

    let register = db.register_service().open(2000, false).await.unwrap();

    let order = db
        .checkout()
        .submit_order(
            &cashier(),
            draft(
                &variant,
                1,
                vec![PaymentDraft::new(PaymentMethod::Dinheiro, 5000)],
                OrderStatus::Completed,
            ),
        )
        .await
        .unwrap();

    assert_eq!(order.cash_register_id.as_deref(), Some(register.id.as_str()));

    let session_orders = db.orders().list_for_register(&register.id).await.unwrap();
    assert_eq!(session_orders.len(), 1);
    assert_eq!(session_orders[0].id, order.id);
}

/// Unknown order ids surface as not-found, not as silent creates.
#[tokio::test]
async fn updating_an_unknown_order_fails() {
    let db = test_db().await;
    let variant = seeded_variant(&db, "CAM-001-M", 5000, 5).await;

    let mut request = draft(
        &variant,
        1,
        vec![PaymentDraft::new(PaymentMethod::Dinheiro, 5000)],
        OrderStatus::Completed,
    );
    request.order_id = Some("00000000-0000-0000-0000-000000000000".to_string());

    let err = db.checkout().submit_order(&cashier(), request).await.unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
}
