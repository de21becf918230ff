use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the storefront services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded {
        session_id: String,
        product_id: Uuid,
    },
    CartItemRemoved {
        session_id: String,
        product_id: Uuid,
    },
    CartCleared(String),

    // Checkout events
    CheckoutStarted {
        order_id: Uuid,
    },
    PaymentSessionCreated {
        order_id: Uuid,
        payment_session_id: String,
    },

    // Reconciliation events
    OrderFinalized(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating delivery failures.
    /// Event delivery is best-effort; the triggering operation has already
    /// succeeded by the time this is called.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Consumes events from the channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderFinalized(order_id) => {
                info!(%order_id, "Order finalized");
            }
            Event::PaymentSessionCreated {
                order_id,
                payment_session_id,
            } => {
                info!(%order_id, %payment_session_id, "Payment session created");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
