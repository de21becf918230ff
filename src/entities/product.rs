use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable design. Pricing lives on the category-scoped variants;
/// the product carries the design name, the sizes it can be printed in,
/// and whether a custom back name may be added.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(nullable)]
    pub collection_id: Option<Uuid>,
    pub name: String,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    /// JSON array of size codes this product is offered in
    #[sea_orm(column_type = "Json")]
    pub available_sizes: Json,
    pub has_customization: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
    #[sea_orm(has_many = "super::product_variant::Entity")]
    ProductVariants,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decodes the stored size-code list. Malformed data reads as no sizes.
    pub fn size_codes(&self) -> Vec<String> {
        serde_json::from_value(self.available_sizes.clone()).unwrap_or_default()
    }

    pub fn offers_size(&self, size: &str) -> bool {
        self.size_codes().iter().any(|s| s == size)
    }
}
