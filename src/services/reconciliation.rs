use crate::{
    entities::{order, order_item, Order},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{notifications::NotificationService, pricing},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Result of a finalize attempt. `AlreadyFinalized` is a normal outcome of
/// the redirect/webhook race, not an error.
#[derive(Debug)]
pub enum FinalizeOutcome {
    Finalized {
        order: order::Model,
        items: Vec<order_item::Model>,
    },
    AlreadyFinalized,
}

/// The pending-unpaid → paid state machine.
///
/// Both confirmation channels (success redirect and signed webhook) funnel
/// into [`finalize`](ReconciliationService::finalize), which applies the
/// transition exactly once per order: a single conditional update keyed on
/// the unpaid state decides the winner, and the loser observes the
/// post-condition as `AlreadyFinalized`.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    notifications: Arc<NotificationService>,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifications,
        }
    }

    /// Finalizes a pending order: flips `paid`, clears the snapshot, and
    /// materializes durable order items. Safe to call any number of times
    /// from any number of workers; exactly one call wins.
    #[instrument(skip(self))]
    pub async fn finalize(&self, order_id: Uuid) -> Result<FinalizeOutcome, ServiceError> {
        let txn = self.db.begin().await?;

        let pending = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if pending.paid {
            txn.commit().await?;
            return Ok(FinalizeOutcome::AlreadyFinalized);
        }

        let snapshot = pending.pending_line_items()?;

        // The atomic transition: only one concurrent caller can move the row
        // out of the unpaid state; everyone else affects zero rows.
        let now = Utc::now();
        let transition = Order::update_many()
            .set(order::ActiveModel {
                paid: Set(true),
                pending_items: Set(None),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Paid.eq(false))
            .exec(&txn)
            .await?;

        if transition.rows_affected == 0 {
            txn.commit().await?;
            return Ok(FinalizeOutcome::AlreadyFinalized);
        }

        let mut items = Vec::with_capacity(snapshot.len());
        for line in &snapshot {
            // Price through the same path checkout used; the snapshot's
            // stored figure is derivable, never blindly trusted.
            let unit_price =
                pricing::unit_price(line.base_price, &line.size, line.customization.is_some());

            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(Some(line.product_id)),
                product_name: Set(line.product_name.clone()),
                color_name: Set(line.color_name.clone()),
                category_name: Set(line.category_name.clone()),
                collection_name: Set(line.collection_name.clone()),
                size: Set(line.size.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(unit_price),
                customization: Set(line.customization.clone()),
                created_at: Set(now),
            };
            items.push(item.insert(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderFinalized(order_id))
            .await;

        let order = order::Model {
            paid: true,
            pending_items: None,
            updated_at: now,
            ..pending
        };

        let total: Decimal = items.iter().map(order_item::Model::line_total).sum();

        // Best-effort: the money has already moved, so a lost email never
        // rolls back payment recognition or fails the triggering request.
        if let Err(e) = self
            .notifications
            .send_order_confirmation(&order, &items, total)
            .await
        {
            error!("Failed to send order notification for {}: {}", order_id, e);
        }

        info!(
            "Finalized order {}: {} items, total {}",
            order_id,
            items.len(),
            total
        );
        Ok(FinalizeOutcome::Finalized { order, items })
    }
}
