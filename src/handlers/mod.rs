pub mod carts;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod payment_webhooks;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        CartService, CatalogService, CheckoutService, NotificationService, PaymentGateway,
        ReconciliationService,
    },
};
use std::sync::Arc;

/// Aggregated services used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: Arc<NotificationService>,
        config: &AppConfig,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(db.clone()));
        let cart = Arc::new(CartService::new(
            catalog.clone(),
            event_sender.clone(),
            config.cart_ttl_secs,
        ));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            catalog.clone(),
            cart.clone(),
            gateway.clone(),
            event_sender.clone(),
            config,
        ));
        let reconciliation = Arc::new(ReconciliationService::new(
            db,
            event_sender,
            notifications,
        ));

        Self {
            catalog,
            cart,
            checkout,
            reconciliation,
            gateway,
        }
    }
}
