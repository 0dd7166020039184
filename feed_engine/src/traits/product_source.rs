use shopify_tools::{ShopifyApiError, ShopifyProduct};

use crate::feed_types::Store;

/// Somewhere to get a store's products from.
#[allow(async_fn_in_trait)]
pub trait ProductSource {
    /// Fetches every active product of `store`, with all of its variants. Implementations are expected to exhaust
    /// pagination before returning, so that a feed is never built from a partial catalogue.
    async fn fetch_products(&self, store: &Store) -> Result<Vec<ShopifyProduct>, ShopifyApiError>;
}
