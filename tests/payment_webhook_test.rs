mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::TestApp;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use sha2::Sha256;
use teamstore_api::{
    entities::{order_item, Order, OrderItem},
    services::{cart::AddToCartInput, checkout::CheckoutInput},
};
use tower::ServiceExt;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const WEBHOOK_PATH: &str = "/api/v1/payments/webhook";

fn completed_event(order_id: Uuid) -> String {
    serde_json::json!({
        "id": format!("evt_{}", Uuid::new_v4()),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "metadata": { "order_id": order_id.to_string() }
            }
        }
    })
    .to_string()
}

fn stripe_signature(secret: &str, body: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

fn signed_request(app: &TestApp, body: String) -> Request<Body> {
    let signature = stripe_signature(&app.state.config.payment_webhook_secret, &body);
    Request::builder()
        .method(Method::POST)
        .uri(WEBHOOK_PATH)
        .header("Stripe-Signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request")
}

async fn checked_out_order(app: &TestApp) -> Uuid {
    let catalog = app.seed_catalog().await;
    app.state
        .services
        .cart
        .add_item(
            "sess-1",
            AddToCartInput {
                product_id: catalog.product_id,
                size: "AL".to_string(),
                quantity: 1,
                category_id: Some(catalog.category_id),
                color_id: Some(catalog.color_id),
                customization: None,
            },
        )
        .await
        .expect("add");

    app.state
        .services
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
async fn signed_completed_event_finalizes_the_order() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;

    let response = app
        .router()
        .oneshot(signed_request(&app, completed_event(order_id)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);

    let order = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .expect("query")
        .expect("order");
    assert!(order.paid);
    assert!(order.pending_items.is_none());

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .count(&*app.state.db)
        .await
        .expect("count");
    assert_eq!(items, 1);
}

#[tokio::test]
async fn duplicate_delivery_is_acknowledged() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;

    let first = app
        .router()
        .oneshot(signed_request(&app, completed_event(order_id)))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    // Redelivery of the same event must be 200, not an error, or the
    // processor would keep retrying a finished payment.
    let second = app
        .router()
        .oneshot(signed_request(&app, completed_event(order_id)))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::OK);

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .count(&*app.state.db)
        .await
        .expect("count");
    assert_eq!(items, 1);
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;

    let body = completed_event(order_id);
    let signature = stripe_signature("whsec_wrong_secret", &body);
    let request = Request::builder()
        .method(Method::POST)
        .uri(WEBHOOK_PATH)
        .header("Stripe-Signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request");

    let response = app.router().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let order = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .expect("query")
        .expect("order");
    assert!(!order.paid, "unverified event must not finalize anything");
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let app = TestApp::new().await;
    let order_id = checked_out_order(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .body(Body::from(completed_event(order_id)))
        .expect("request");

    let response = app.router().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_order_is_rejected_with_404() {
    let app = TestApp::new().await;
    app.seed_catalog().await;

    let response = app
        .router()
        .oneshot(signed_request(&app, completed_event(Uuid::new_v4())))
        .await
        .expect("response");

    // HTTP-level rejection lets the processor redeliver later.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let orders = Order::find().count(&*app.state.db).await.expect("count");
    assert_eq!(orders, 0, "no order may be created from a stray event");
}

#[tokio::test]
async fn event_without_order_metadata_is_rejected() {
    let app = TestApp::new().await;

    let body = serde_json::json!({
        "type": "checkout.session.completed",
        "data": { "object": { "metadata": {} } }
    })
    .to_string();

    let response = app
        .router()
        .oneshot(signed_request(&app, body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unrelated_event_types_are_acknowledged() {
    let app = TestApp::new().await;

    let body = serde_json::json!({
        "type": "charge.refunded",
        "data": { "object": {} }
    })
    .to_string();

    let response = app
        .router()
        .oneshot(signed_request(&app, body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .router()
        .oneshot(signed_request(&app, "{not-json".to_string()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
