mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use teamstore_api::{
    entities::{order_item, Order, OrderItem},
    errors::ServiceError,
    services::{cart::AddToCartInput, checkout::CheckoutInput, FinalizeOutcome},
};
use uuid::Uuid;

async fn checked_out_order(app: &TestApp) -> Uuid {
    let catalog = app.seed_catalog().await;
    let services = &app.state.services;

    let mut custom = AddToCartInput {
        product_id: catalog.product_id,
        size: "2X".to_string(),
        quantity: 1,
        category_id: Some(catalog.category_id),
        color_id: Some(catalog.color_id),
        customization: Some("SMITH".to_string()),
    };
    services
        .cart
        .add_item("sess-1", custom.clone())
        .await
        .expect("add");

    custom.size = "AL".to_string();
    custom.quantity = 2;
    custom.customization = None;
    services.cart.add_item("sess-1", custom).await.expect("add");

    services
        .checkout
        .checkout(
            "sess-1",
            CheckoutInput {
                customer_name: "John Doe".to_string(),
                customer_email: "john@test.com".to_string(),
            },
        )
        .await
        .expect("checkout")
        .order_id
}

#[tokio::test]
async fn finalize_materializes_items_exactly_once() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;
    let reconciliation = &app.state.services.reconciliation;

    let outcome = reconciliation.finalize(order_id).await.expect("finalize");
    let FinalizeOutcome::Finalized { order, items } = outcome else {
        panic!("first finalize must materialize");
    };

    assert!(order.paid);
    assert!(order.pending_items.is_none());
    assert_eq!(items.len(), 2);

    // Snapshot prices flow into the durable items through the pricing rules.
    let custom_line = items
        .iter()
        .find(|i| i.customization.is_some())
        .expect("customized line");
    assert_eq!(custom_line.unit_price, dec!(29.00));
    let plain_line = items
        .iter()
        .find(|i| i.customization.is_none())
        .expect("plain line");
    assert_eq!(plain_line.unit_price, dec!(25.00));
    assert_eq!(plain_line.quantity, 2);

    // Database agrees with the returned models.
    let stored = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .expect("query")
        .expect("order");
    assert!(stored.paid);
    assert!(stored.pending_items.is_none());

    let stored_items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .count(&*app.state.db)
        .await
        .expect("count");
    assert_eq!(stored_items, 2);
}

#[tokio::test]
async fn second_finalize_is_a_no_op() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;
    let reconciliation = &app.state.services.reconciliation;

    let first = reconciliation.finalize(order_id).await.expect("finalize");
    assert!(matches!(first, FinalizeOutcome::Finalized { .. }));

    let second = reconciliation.finalize(order_id).await.expect("finalize");
    assert!(matches!(second, FinalizeOutcome::AlreadyFinalized));

    // No duplicate materialization.
    let stored_items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .count(&*app.state.db)
        .await
        .expect("count");
    assert_eq!(stored_items, 2);
}

#[tokio::test]
async fn concurrent_finalize_yields_one_materialization() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;
    let reconciliation = app.state.services.reconciliation.clone();

    // The redirect and the webhook race for the same order.
    let left = {
        let svc = reconciliation.clone();
        tokio::spawn(async move { svc.finalize(order_id).await })
    };
    let right = {
        let svc = reconciliation.clone();
        tokio::spawn(async move { svc.finalize(order_id).await })
    };

    let outcomes = [
        left.await.expect("join").expect("finalize"),
        right.await.expect("join").expect("finalize"),
    ];

    let finalized = outcomes
        .iter()
        .filter(|o| matches!(o, FinalizeOutcome::Finalized { .. }))
        .count();
    let already = outcomes
        .iter()
        .filter(|o| matches!(o, FinalizeOutcome::AlreadyFinalized))
        .count();
    assert_eq!(finalized, 1, "exactly one caller wins the transition");
    assert_eq!(already, 1, "the loser observes the post-condition");

    let stored_items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .count(&*app.state.db)
        .await
        .expect("count");
    assert_eq!(stored_items, 2, "no duplicate order items");
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .reconciliation
        .finalize(Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let order_count = Order::find().count(&*app.state.db).await.expect("count");
    assert_eq!(order_count, 0);
}

#[tokio::test]
async fn success_redirect_and_webhook_paths_share_idempotency() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;
    let services = &app.state.services;

    // Resolve the payment session the way the success redirect does.
    let session_id = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .expect("query")
        .expect("order")
        .payment_session_id
        .expect("session id persisted");

    let resolved = services
        .gateway
        .find_order_for_session(&session_id)
        .await
        .expect("session lookup")
        .expect("order resolves");
    assert_eq!(resolved, order_id);

    let first = services
        .reconciliation
        .finalize(resolved)
        .await
        .expect("finalize");
    assert!(matches!(first, FinalizeOutcome::Finalized { .. }));

    // The webhook arriving later sees AlreadyFinalized.
    let second = services
        .reconciliation
        .finalize(order_id)
        .await
        .expect("finalize");
    assert!(matches!(second, FinalizeOutcome::AlreadyFinalized));
}
