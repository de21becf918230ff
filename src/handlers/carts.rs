use crate::handlers::common::{created_response, no_content_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::cart::{AddToCartInput, CartView},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for session-cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/{session_id}", get(get_cart))
        .route("/{session_id}/items", post(add_to_cart))
        .route(
            "/{session_id}/items/{product_id}/{size}",
            delete(remove_cart_item),
        )
        .route("/{session_id}/clear", post(clear_cart))
}

/// Get the session's cart with display pricing
#[utoipa::path(
    get,
    path = "/api/v1/carts/{session_id}",
    params(("session_id" = String, Path, description = "Opaque cart session token")),
    responses((status = 200, description = "Cart contents", body = CartView)),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.cart.view(&session_id)))
}

/// Add an item to the session's cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/{session_id}/items",
    params(("session_id" = String, Path, description = "Opaque cart session token")),
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Line item added"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = AddToCartInput {
        product_id: payload.product_id,
        size: payload.size,
        quantity: payload.quantity,
        category_id: payload.category_id,
        color_id: payload.color_id,
        customization: payload.customization,
    };

    let line = state.services.cart.add_item(&session_id, input).await?;
    Ok(created_response(line))
}

/// Remove the first line matching (product, size)
#[utoipa::path(
    delete,
    path = "/api/v1/carts/{session_id}/items/{product_id}/{size}",
    params(
        ("session_id" = String, Path, description = "Opaque cart session token"),
        ("product_id" = Uuid, Path, description = "Product referenced by the line"),
        ("size" = String, Path, description = "Size code of the line")
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "No matching line", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    Path((session_id, product_id, size)): Path<(String, Uuid, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let removed = state
        .services
        .cart
        .remove_item(&session_id, product_id, &size)
        .await;

    if removed {
        Ok(no_content_response())
    } else {
        Err(ServiceError::NotFound(format!(
            "No cart line for product {} size {}",
            product_id, size
        )))
    }
}

/// Clear the session's cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/{session_id}/clear",
    params(("session_id" = String, Path, description = "Opaque cart session token")),
    responses((status = 200, description = "Cart cleared")),
    tag = "Carts"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.cart.clear(&session_id).await;

    Ok(success_response(serde_json::json!({
        "message": "Cart cleared successfully"
    })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub size: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub category_id: Option<Uuid>,
    pub color_id: Option<Uuid>,
    /// Printed name, only honored for products offering customization
    pub customization: Option<String>,
}
