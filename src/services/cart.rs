use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog::CatalogService, pricing},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Session-scoped shopping carts.
///
/// Carts are the only mutable customer-visible state before checkout. They
/// are keyed by an opaque session identifier, held in process memory with a
/// TTL, and never visible across sessions. Line items snapshot the *base*
/// variant price only; surcharges are recomputed at every read so a stale or
/// tampered display price can never become a charge.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<CatalogService>,
    event_sender: Arc<EventSender>,
    carts: Arc<DashMap<String, CartEntry>>,
    ttl: Duration,
}

#[derive(Debug, Clone)]
struct CartEntry {
    items: Vec<CartLine>,
    updated_at: DateTime<Utc>,
}

/// One cart line. `unit_price` is the base variant price captured at
/// add-time, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub size: String,
    pub quantity: i32,
    pub color_id: Option<Uuid>,
    pub color_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub collection_name: Option<String>,
    pub customization: Option<String>,
    pub unit_price: Decimal,
}

/// Input for adding an item to a session cart
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
    pub category_id: Option<Uuid>,
    pub color_id: Option<Uuid>,
    pub customization: Option<String>,
}

/// Display projection of a cart line with surcharges applied.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLineView {
    pub product_id: Uuid,
    pub product_name: String,
    pub size: String,
    pub quantity: i32,
    pub color_name: Option<String>,
    pub category_name: Option<String>,
    pub customization: Option<String>,
    /// Base variant price captured at add time
    pub base_unit_price: Decimal,
    /// Advisory price with surcharges; the charge is recomputed at checkout
    pub display_unit_price: Decimal,
    pub line_total: Decimal,
}

/// Cart contents with an advisory total
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: Decimal,
}

impl CartService {
    pub fn new(
        catalog: Arc<CatalogService>,
        event_sender: Arc<EventSender>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            catalog,
            event_sender,
            carts: Arc::new(DashMap::new()),
            ttl: Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64),
        }
    }

    /// Appends a line item to the session's cart.
    ///
    /// The product must exist and be active; the size is accepted as-is and
    /// only validated against the product's available sizes at checkout, so
    /// a cart may legitimately go stale between add and checkout.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        session_id: &str,
        input: AddToCartInput,
    ) -> Result<CartLine, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self.catalog.get_active_product(input.product_id).await?;
        let variant = self
            .catalog
            .resolve_variant(input.product_id, input.category_id, input.color_id)
            .await?;

        // A printed name is only honored for products that offer it.
        let customization = if product.has_customization {
            input
                .customization
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        let line = CartLine {
            product_id: product.id,
            product_name: product.name.clone(),
            size: input.size.clone(),
            quantity: input.quantity,
            color_id: input.color_id,
            color_name: variant.color_name.clone(),
            category_id: variant.category_id,
            category_name: variant.category_name.clone(),
            collection_name: product.collection_name.clone(),
            customization,
            unit_price: variant.price,
        };

        let now = Utc::now();
        let mut entry = self.carts.entry(session_id.to_string()).or_insert_with(|| CartEntry {
            items: Vec::new(),
            updated_at: now,
        });
        if now - entry.updated_at > self.ttl {
            entry.items.clear();
        }
        entry.items.push(line.clone());
        entry.updated_at = now;
        drop(entry);

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                session_id: session_id.to_string(),
                product_id: product.id,
            })
            .await;

        info!(
            "Added item to cart {}: product {} size {} x{}",
            session_id, product.id, line.size, line.quantity
        );
        Ok(line)
    }

    /// Removes the first line matching (product, size). Duplicate
    /// product/size combinations collapse under this key, one per call.
    pub async fn remove_item(&self, session_id: &str, product_id: Uuid, size: &str) -> bool {
        let removed = match self.carts.get_mut(session_id) {
            Some(mut entry) => {
                let before = entry.items.len();
                if let Some(pos) = entry
                    .items
                    .iter()
                    .position(|line| line.product_id == product_id && line.size == size)
                {
                    entry.items.remove(pos);
                }
                entry.updated_at = Utc::now();
                entry.items.len() < before
            }
            None => false,
        };

        if removed {
            self.event_sender
                .send_or_log(Event::CartItemRemoved {
                    session_id: session_id.to_string(),
                    product_id,
                })
                .await;
        }
        removed
    }

    /// Current cart lines in insertion order. Expired carts read as empty.
    pub fn items(&self, session_id: &str) -> Vec<CartLine> {
        match self.carts.get(session_id) {
            Some(entry) if Utc::now() - entry.updated_at <= self.ttl => entry.items.clone(),
            _ => Vec::new(),
        }
    }

    /// Drops the session's cart entirely.
    pub async fn clear(&self, session_id: &str) {
        self.carts.remove(session_id);
        self.event_sender
            .send_or_log(Event::CartCleared(session_id.to_string()))
            .await;
    }

    /// Display projection with surcharges applied per line. Advisory only;
    /// the authoritative charge is recomputed at checkout.
    pub fn view(&self, session_id: &str) -> CartView {
        let items: Vec<CartLineView> = self
            .items(session_id)
            .into_iter()
            .map(|line| {
                let display_unit_price = pricing::unit_price(
                    line.unit_price,
                    &line.size,
                    line.customization.is_some(),
                );
                let line_total = pricing::line_total(display_unit_price, line.quantity);
                CartLineView {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    size: line.size,
                    quantity: line.quantity,
                    color_name: line.color_name,
                    category_name: line.category_name,
                    customization: line.customization,
                    base_unit_price: line.unit_price,
                    display_unit_price,
                    line_total,
                }
            })
            .collect();

        let total = items.iter().map(|i| i.line_total).sum();
        CartView { items, total }
    }
}
