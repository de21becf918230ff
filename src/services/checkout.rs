use crate::{
    config::AppConfig,
    entities::{order, PendingLineItem},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        cart::CartService,
        catalog::CatalogService,
        payments::{self, CreateSessionRequest, PaymentGateway, SessionLineItem},
        pricing,
    },
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Converts a session cart into an unpaid pending order and a hosted
/// payment session.
///
/// The cart is re-validated against the live catalog and re-priced here;
/// nothing captured at add-time is trusted for the charge. The pending order
/// is durable before the processor is called, so a processor failure leaves
/// a harmless unpaid row rather than a half-charged customer.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    catalog: Arc<CatalogService>,
    cart: Arc<CartService>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
    currency: String,
    success_url: String,
    cancel_url: String,
}

/// Customer details collected on the checkout form
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub customer_name: String,
    pub customer_email: String,
}

/// Where to send the customer next, plus the order the redirect pays for.
#[derive(Debug, Clone)]
pub struct CheckoutRedirect {
    pub order_id: Uuid,
    pub checkout_url: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: Arc<CatalogService>,
        cart: Arc<CartService>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        Self {
            db,
            catalog,
            cart,
            gateway,
            event_sender,
            currency: config.currency.clone(),
            success_url: config.checkout_success_url(),
            cancel_url: config.checkout_cancel_url(),
        }
    }

    /// Runs the full checkout hand-off for a session cart and returns the
    /// hosted checkout URL for the caller to redirect to.
    #[instrument(skip(self, input))]
    pub async fn checkout(
        &self,
        session_id: &str,
        input: CheckoutInput,
    ) -> Result<CheckoutRedirect, ServiceError> {
        let lines = self.cart.items(session_id);
        if lines.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        // Authoritative validation: drop lines whose product vanished, was
        // retired, or no longer offers the chosen size. A stale cart is
        // normal, not an error.
        let mut snapshot = Vec::with_capacity(lines.len());
        let mut session_items = Vec::with_capacity(lines.len());
        for line in lines {
            let Some(product) = self.catalog.find_product(line.product_id).await? else {
                debug!("Dropping cart line: product {} gone", line.product_id);
                continue;
            };
            if !product.active || !product.offers_size(&line.size) {
                debug!(
                    "Dropping cart line: product {} no longer offers size {}",
                    line.product_id, line.size
                );
                continue;
            }

            let variant = self
                .catalog
                .resolve_variant(line.product_id, line.category_id, line.color_id)
                .await?;

            let customization = if product.has_customization {
                line.customization.clone()
            } else {
                None
            };
            let unit_price =
                pricing::unit_price(variant.price, &line.size, customization.is_some());

            let item = PendingLineItem {
                product_id: product.id,
                product_name: product.name.clone(),
                size: line.size.clone(),
                quantity: line.quantity,
                color_id: line.color_id,
                color_name: variant.color_name.or(line.color_name),
                category_id: variant.category_id.or(line.category_id),
                category_name: variant.category_name.or(line.category_name),
                collection_name: product.collection_name.clone(),
                customization,
                base_price: variant.price,
                unit_price,
            };
            session_items.push(SessionLineItem {
                name: item.product_name.clone(),
                description: Some(line_description(&item)),
                unit_amount: payments::to_minor_units(item.unit_price)?,
                quantity: i64::from(item.quantity),
                image_url: product.image_url.clone(),
            });
            snapshot.push(item);
        }

        if snapshot.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let pending = order::ActiveModel {
            id: Set(order_id),
            customer_name: Set(input.customer_name.clone()),
            customer_email: Set(input.customer_email.clone()),
            paid: Set(false),
            pending_items: Set(Some(serde_json::to_value(&snapshot)?)),
            payment_session_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let pending = pending.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CheckoutStarted { order_id })
            .await;

        let request = CreateSessionRequest {
            order_id,
            customer_email: input.customer_email.clone(),
            currency: self.currency.clone(),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            line_items: session_items,
        };

        let session = match self.gateway.create_checkout_session(request).await {
            Ok(session) => session,
            Err(e) => {
                // The pending order stays behind unpaid with no session id;
                // a retention sweep reclaims such rows out of band.
                error!(
                    "Payment session creation failed for order {}: {}",
                    order_id, e
                );
                return Err(e);
            }
        };

        let mut update: order::ActiveModel = pending.into();
        update.payment_session_id = Set(Some(session.id.clone()));
        update.updated_at = Set(Utc::now());
        update.update(&*self.db).await?;

        self.cart.clear(session_id).await;

        self.event_sender
            .send_or_log(Event::PaymentSessionCreated {
                order_id,
                payment_session_id: session.id.clone(),
            })
            .await;

        info!(
            "Checkout started: order {} handed to payment session {}",
            order_id, session.id
        );
        Ok(CheckoutRedirect {
            order_id,
            checkout_url: session.url,
        })
    }
}

/// Line description shown on the hosted payment page.
fn line_description(item: &PendingLineItem) -> String {
    let mut parts = vec![format!("Size: {}", item.size)];
    if let Some(color) = &item.color_name {
        parts.push(format!("Color: {}", color));
    }
    if let Some(category) = &item.category_name {
        parts.push(format!("Category: {}", category));
    }
    if let Some(name) = &item.customization {
        parts.push(format!("Custom Name: {}", name));
    }
    parts.join(" | ")
}
