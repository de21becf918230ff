use crate::{
    entities::{collection, product, product_category, product_color, product_variant},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read-only catalog lookups used by the cart and checkout pipeline.
///
/// Catalog administration lives elsewhere; this service only answers
/// "does this product exist and what does a unit of it cost".
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

/// Product data as the ordering pipeline sees it.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub available_sizes: Vec<String>,
    pub has_customization: bool,
    pub image_url: Option<String>,
    pub collection_name: Option<String>,
}

impl CatalogProduct {
    pub fn offers_size(&self, size: &str) -> bool {
        self.available_sizes.iter().any(|s| s == size)
    }
}

/// Base price resolution for a product, scoped to a category when one was
/// chosen, with the display names that go into line-item snapshots.
#[derive(Debug, Clone)]
pub struct ResolvedVariant {
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub color_name: Option<String>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Looks up a product regardless of its active flag. Returns `None` for
    /// products that no longer exist; checkout uses this to drop stale lines.
    #[instrument(skip(self))]
    pub async fn find_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<CatalogProduct>, ServiceError> {
        let Some(found) = product::Entity::find_by_id(product_id).one(&*self.db).await? else {
            return Ok(None);
        };

        let collection_name = match found.collection_id {
            Some(collection_id) => collection::Entity::find_by_id(collection_id)
                .one(&*self.db)
                .await?
                .map(|c| c.name),
            None => None,
        };

        Ok(Some(CatalogProduct {
            id: found.id,
            name: found.name.clone(),
            active: found.active,
            available_sizes: found.size_codes(),
            has_customization: found.has_customization,
            image_url: found.image_url.clone(),
            collection_name,
        }))
    }

    /// Looks up an active product, failing with `NotFound` for products that
    /// are missing or retired. Used by add-to-cart.
    pub async fn get_active_product(
        &self,
        product_id: Uuid,
    ) -> Result<CatalogProduct, ServiceError> {
        match self.find_product(product_id).await? {
            Some(p) if p.active => Ok(p),
            _ => Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            ))),
        }
    }

    /// Resolves the base price for a product: the variant in the chosen
    /// category when one was given, otherwise the first variant, otherwise
    /// zero. Also resolves the category and color names for snapshotting.
    #[instrument(skip(self))]
    pub async fn resolve_variant(
        &self,
        product_id: Uuid,
        category_id: Option<Uuid>,
        color_id: Option<Uuid>,
    ) -> Result<ResolvedVariant, ServiceError> {
        let mut variant = None;

        if let Some(category_id) = category_id {
            variant = product_variant::Entity::find()
                .filter(product_variant::Column::ProductId.eq(product_id))
                .filter(product_variant::Column::CategoryId.eq(category_id))
                .order_by_asc(product_variant::Column::CreatedAt)
                .one(&*self.db)
                .await?;
        }

        if variant.is_none() {
            variant = product_variant::Entity::find()
                .filter(product_variant::Column::ProductId.eq(product_id))
                .order_by_asc(product_variant::Column::CreatedAt)
                .one(&*self.db)
                .await?;
        }

        let Some(variant) = variant else {
            // No variants configured: the product is effectively priced at
            // zero until the catalog is fixed.
            return Ok(ResolvedVariant {
                price: Decimal::ZERO,
                category_id,
                category_name: None,
                color_name: self.color_name(color_id).await?,
            });
        };

        let category_name = product_category::Entity::find_by_id(variant.category_id)
            .one(&*self.db)
            .await?
            .map(|c| c.name);

        let color_name = match self.color_name(color_id).await? {
            Some(name) => Some(name),
            None => self.color_name(variant.color_id).await?,
        };

        Ok(ResolvedVariant {
            price: variant.price,
            category_id: Some(variant.category_id),
            category_name,
            color_name,
        })
    }

    async fn color_name(&self, color_id: Option<Uuid>) -> Result<Option<String>, ServiceError> {
        let Some(color_id) = color_id else {
            return Ok(None);
        };
        Ok(product_color::Entity::find_by_id(color_id)
            .one(&*self.db)
            .await?
            .map(|c| c.name))
    }
}
