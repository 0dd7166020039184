//! A thin client for the parts of the Shopify Admin API the feed generator needs: paginated product listings over
//! REST and file uploads to the Shopify Files CDN over GraphQL.
mod api;
mod config;
mod error;
mod retry;
mod shopify_product;

pub mod data_objects;
pub mod helpers;

pub use api::ShopifyApi;
pub use config::{ShopifyConfig, DEFAULT_API_VERSION, MAX_PAGE_SIZE};
pub use error::ShopifyApiError;
pub use retry::RetryPolicy;
pub use shopify_product::{InventoryPolicy, ProductImage, ProductOption, ShopifyProduct, Variant};
