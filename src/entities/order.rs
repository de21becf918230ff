use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer order. Created unpaid at checkout time with the validated,
/// priced cart serialized into `pending_items`; reconciliation flips `paid`,
/// clears the snapshot, and materializes durable order items — exactly once.
///
/// The v4 id doubles as the externally-unguessable token handed to the
/// payment processor; no other identifier ever leaves the system.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub paid: bool,
    /// Snapshot of the validated cart; present exactly while unpaid
    #[sea_orm(column_type = "Json", nullable)]
    pub pending_items: Option<Json>,
    #[sea_orm(nullable)]
    pub payment_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decodes the pending snapshot, if any.
    pub fn pending_line_items(&self) -> Result<Vec<PendingLineItem>, serde_json::Error> {
        match &self.pending_items {
            Some(json) => serde_json::from_value(json.clone()),
            None => Ok(Vec::new()),
        }
    }
}

/// One validated, priced cart line captured at checkout time.
///
/// `base_price` is the raw variant price; `unit_price` is the authoritative
/// charge after size and customization surcharges. Both are kept so that
/// finalization can run the same pricing path again instead of trusting a
/// stored total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub size: String,
    pub quantity: i32,
    #[serde(default)]
    pub color_id: Option<Uuid>,
    #[serde(default)]
    pub color_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub customization: Option<String>,
    pub base_price: Decimal,
    pub unit_price: Decimal,
}
