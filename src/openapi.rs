use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "teamstore-api",
        description = "Custom-apparel storefront backend: session carts, checkout, and payment reconciliation"
    ),
    paths(
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_to_cart,
        crate::handlers::carts::remove_cart_item,
        crate::handlers::carts::clear_cart,
        crate::handlers::checkout::start_checkout,
        crate::handlers::checkout::payment_success,
        crate::handlers::checkout::payment_cancel,
        crate::handlers::orders::get_order,
        crate::handlers::payment_webhooks::payment_webhook,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::cart::CartLine,
        crate::services::cart::CartLineView,
        crate::services::cart::CartView,
        crate::handlers::carts::AddItemRequest,
        crate::handlers::checkout::StartCheckoutRequest,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::checkout::PaymentSuccessResponse,
        crate::handlers::orders::OrderResponse,
        crate::handlers::orders::OrderItemResponse,
    )),
    tags(
        (name = "Carts", description = "Session cart management"),
        (name = "Checkout", description = "Checkout hand-off and payment callbacks"),
        (name = "Orders", description = "Order lookup"),
        (name = "Payments", description = "Inbound payment events")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
