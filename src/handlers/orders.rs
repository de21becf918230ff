use crate::handlers::common::success_response;
use crate::{
    entities::{order, order_item, Order},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, ModelTrait};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for order read endpoints
pub fn orders_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(get_order))
}

/// Fetch an order with its materialized items. Unpaid pending orders read
/// back with `paid = false` and no items.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order token")),
    responses(
        (status = 200, description = "Order detail", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = Order::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

    let items = order
        .find_related(crate::entities::OrderItem)
        .all(&*state.db)
        .await?;

    Ok(success_response(OrderResponse::from_models(order, items)))
}

// Response DTOs

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_name: String,
    pub color_name: Option<String>,
    pub category_name: Option<String>,
    pub collection_name: Option<String>,
    pub size: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub customization: Option<String>,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub total: Decimal,
}

impl OrderResponse {
    fn from_models(order: order::Model, items: Vec<order_item::Model>) -> Self {
        let items: Vec<OrderItemResponse> = items
            .into_iter()
            .map(|item| {
                let line_total = item.line_total();
                OrderItemResponse {
                    product_name: item.product_name,
                    color_name: item.color_name,
                    category_name: item.category_name,
                    collection_name: item.collection_name,
                    size: item.size,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    customization: item.customization,
                    line_total,
                }
            })
            .collect();

        let total = items.iter().map(|i| i.line_total).sum();

        Self {
            id: order.id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            paid: order.paid,
            created_at: order.created_at,
            items,
            total,
        }
    }
}
