use crate::handlers::common::{success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::{checkout::CheckoutInput, FinalizeOutcome},
    AppState,
};
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(start_checkout))
        .route("/success", get(payment_success))
        .route("/cancel", get(payment_cancel))
}

/// Validate the cart, persist a pending order, and open a hosted payment session
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = StartCheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout session created", body = CheckoutResponse),
        (status = 400, description = "Empty cart or invalid input", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment provider unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn start_checkout(
    State(state): State<AppState>,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let redirect = state
        .services
        .checkout
        .checkout(
            &payload.session_id,
            CheckoutInput {
                customer_name: payload.customer_name,
                customer_email: payload.customer_email,
            },
        )
        .await?;

    Ok(success_response(CheckoutResponse {
        order_id: redirect.order_id,
        checkout_url: redirect.checkout_url,
    }))
}

/// Success-redirect confirmation channel: resolve the payment session to an
/// order and finalize it. Idempotent; a refreshed page gets the same answer.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/success",
    params(("session_id" = String, Query, description = "Hosted payment session reference")),
    responses(
        (status = 200, description = "Order finalized (or already was)", body = PaymentSuccessResponse),
        (status = 404, description = "Session does not reference a known order", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn payment_success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_id = state
        .services
        .gateway
        .find_order_for_session(&query.session_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Payment session {} does not reference an order",
                query.session_id
            ))
        })?;

    let outcome = state.services.reconciliation.finalize(order_id).await?;
    let status = match outcome {
        FinalizeOutcome::Finalized { .. } => "finalized",
        FinalizeOutcome::AlreadyFinalized => "already_finalized",
    };

    Ok(success_response(PaymentSuccessResponse {
        order_id,
        status: status.to_string(),
    }))
}

/// Cancel callback for an abandoned hosted checkout
#[utoipa::path(
    get,
    path = "/api/v1/checkout/cancel",
    responses((status = 200, description = "Checkout canceled acknowledgement")),
    tag = "Checkout"
)]
pub async fn payment_cancel() -> impl IntoResponse {
    success_response(serde_json::json!({
        "message": "Checkout canceled. You have not been charged."
    }))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartCheckoutRequest {
    #[validate(length(min = 1))]
    pub session_id: String,
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub checkout_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentSuccessResponse {
    pub order_id: Uuid,
    pub status: String,
}
