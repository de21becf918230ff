/// Storefront services module - cart-to-paid-order pipeline
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod notifications;
pub mod payments;
pub mod pricing;
pub mod reconciliation;

// Re-export services for convenience
pub use cart::{AddToCartInput, CartLine, CartService, CartView};
pub use catalog::{CatalogProduct, CatalogService, ResolvedVariant};
pub use checkout::{CheckoutInput, CheckoutRedirect, CheckoutService};
pub use notifications::NotificationService;
pub use payments::{
    CreateSessionRequest, HostedSession, PaymentGateway, SessionLineItem, StripeGateway,
};
pub use reconciliation::{FinalizeOutcome, ReconciliationService};
