/// Storefront entities module
pub mod collection;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod product_color;
pub mod product_variant;

// Re-export entities
pub use collection::{Entity as Collection, Model as CollectionModel};
pub use order::{Entity as Order, Model as OrderModel, PendingLineItem};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_category::{Entity as ProductCategory, Model as ProductCategoryModel};
pub use product_color::{Entity as ProductColor, Model as ProductColorModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
