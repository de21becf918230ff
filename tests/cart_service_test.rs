mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use teamstore_api::{errors::ServiceError, services::cart::AddToCartInput};
use uuid::Uuid;

fn add_input(catalog: &common::SeededCatalog, size: &str, quantity: i32) -> AddToCartInput {
    AddToCartInput {
        product_id: catalog.product_id,
        size: size.to_string(),
        quantity,
        category_id: Some(catalog.category_id),
        color_id: Some(catalog.color_id),
        customization: None,
    }
}

#[tokio::test]
async fn add_then_list_round_trips() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    let line = cart
        .add_item("sess-1", add_input(&catalog, "AL", 2))
        .await
        .expect("add item");

    assert_eq!(line.product_id, catalog.product_id);
    assert_eq!(line.size, "AL");
    assert_eq!(line.quantity, 2);
    assert_eq!(line.product_name, "Test Shirt");

    let items = cart.items("sess-1");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], line);
}

#[tokio::test]
async fn add_captures_base_price_without_surcharges() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    // 2X would carry a surcharge at checkout, but the stored line keeps the
    // base variant price.
    let mut input = add_input(&catalog, "2X", 1);
    input.customization = Some("SMITH".to_string());
    let line = cart.add_item("sess-1", input).await.expect("add item");

    assert_eq!(line.unit_price, dec!(25.00));
    assert_eq!(line.customization.as_deref(), Some("SMITH"));
}

#[tokio::test]
async fn view_applies_display_surcharges() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    let mut input = add_input(&catalog, "2X", 1);
    input.customization = Some("SMITH".to_string());
    cart.add_item("sess-1", input).await.expect("add item");

    let view = cart.view("sess-1");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].base_unit_price, dec!(25.00));
    // Base 25 + size 2 + custom name 2
    assert_eq!(view.items[0].display_unit_price, dec!(29.00));
    assert_eq!(view.total, dec!(29.00));
}

#[tokio::test]
async fn remove_matches_product_and_size() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    cart.add_item("sess-1", add_input(&catalog, "AL", 1))
        .await
        .expect("add item");
    cart.add_item("sess-1", add_input(&catalog, "2X", 1))
        .await
        .expect("add item");

    // Wrong size removes nothing
    assert!(!cart.remove_item("sess-1", catalog.product_id, "AM").await);
    assert_eq!(cart.items("sess-1").len(), 2);

    assert!(cart.remove_item("sess-1", catalog.product_id, "AL").await);
    let items = cart.items("sess-1");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].size, "2X");

    assert!(cart.remove_item("sess-1", catalog.product_id, "2X").await);
    assert!(cart.items("sess-1").is_empty());
}

#[tokio::test]
async fn remove_takes_first_of_duplicate_lines() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    cart.add_item("sess-1", add_input(&catalog, "AL", 1))
        .await
        .expect("add item");
    cart.add_item("sess-1", add_input(&catalog, "AL", 3))
        .await
        .expect("add item");

    assert!(cart.remove_item("sess-1", catalog.product_id, "AL").await);
    let items = cart.items("sess-1");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
}

#[tokio::test]
async fn carts_are_session_scoped() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    cart.add_item("sess-1", add_input(&catalog, "AL", 1))
        .await
        .expect("add item");

    assert!(cart.items("sess-2").is_empty());
    cart.clear("sess-2").await;
    assert_eq!(cart.items("sess-1").len(), 1);
}

#[tokio::test]
async fn clear_empties_the_cart() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let cart = &app.state.services.cart;

    cart.add_item("sess-1", add_input(&catalog, "AL", 1))
        .await
        .expect("add item");
    cart.clear("sess-1").await;

    assert!(cart.items("sess-1").is_empty());
    assert_eq!(cart.view("sess-1").total, dec!(0));
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let app = TestApp::new().await;
    app.seed_catalog().await;
    let cart = &app.state.services.cart;

    let result = cart
        .add_item(
            "sess-1",
            AddToCartInput {
                product_id: Uuid::new_v4(),
                size: "AL".to_string(),
                quantity: 1,
                category_id: None,
                color_id: None,
                customization: None,
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn inactive_product_is_rejected() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let mut retired: teamstore_api::entities::product::ActiveModel =
        teamstore_api::entities::Product::find_by_id(catalog.product_id)
            .one(&*app.state.db)
            .await
            .expect("query product")
            .expect("product exists")
            .into();
    retired.active = Set(false);
    retired.update(&*app.state.db).await.expect("retire product");

    let result = app
        .state
        .services
        .cart
        .add_item("sess-1", add_input(&catalog, "AL", 1))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let result = app
        .state
        .services
        .cart
        .add_item("sess-1", add_input(&catalog, "AL", 0))
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn unavailable_size_is_accepted_at_add_time() {
    // Optimistic add: size validation is deferred to checkout.
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let line = app
        .state
        .services
        .cart
        .add_item("sess-1", add_input(&catalog, "5X", 1))
        .await
        .expect("add item");

    assert_eq!(line.size, "5X");
}

#[tokio::test]
async fn customization_ignored_for_plain_products() {
    let app = TestApp::new().await;
    let catalog = app
        .seed_product("Plain Tee", &["AL"], false, dec!(20.00))
        .await;

    let mut input = add_input(&catalog, "AL", 1);
    input.customization = Some("SMITH".to_string());
    let line = app
        .state
        .services
        .cart
        .add_item("sess-1", input)
        .await
        .expect("add item");

    assert!(line.customization.is_none());
}

#[tokio::test]
async fn blank_customization_normalizes_to_none() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let mut input = add_input(&catalog, "AL", 1);
    input.customization = Some("   ".to_string());
    let line = app
        .state
        .services
        .cart
        .add_item("sess-1", input)
        .await
        .expect("add item");

    assert!(line.customization.is_none());
}
