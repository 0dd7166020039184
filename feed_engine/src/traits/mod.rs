//! The seams between the feed pipeline and the outside world. [`crate::ShopifyBackend`] implements both traits
//! against the Shopify Admin API; tests use in-memory implementations.
mod feed_uploader;
mod product_source;

pub use feed_uploader::{FeedUploader, NoUpload};
pub use product_source::ProductSource;
