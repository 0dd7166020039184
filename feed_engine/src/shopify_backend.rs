use std::path::Path;

use log::*;
use shopify_tools::{ShopifyApi, ShopifyApiError, ShopifyProduct};

use crate::{
    config::FeedSettings,
    feed_types::Store,
    traits::{FeedUploader, ProductSource},
};

/// Talks to the Admin API of each store with that store's own credentials.
#[derive(Debug, Clone)]
pub struct ShopifyBackend {
    settings: FeedSettings,
}

impl ShopifyBackend {
    pub fn new(settings: FeedSettings) -> Self {
        Self { settings }
    }

    fn api_for(&self, store: &Store) -> Result<ShopifyApi, ShopifyApiError> {
        ShopifyApi::new(self.settings.shopify_config(store))
    }
}

impl ProductSource for ShopifyBackend {
    async fn fetch_products(&self, store: &Store) -> Result<Vec<ShopifyProduct>, ShopifyApiError> {
        info!("📦️ Fetching products for {store}");
        let api = self.api_for(store)?;
        api.fetch_all_products().await
    }
}

impl FeedUploader for ShopifyBackend {
    async fn upload(&self, store: &Store, local_path: &Path, file_name: &str) -> Result<String, ShopifyApiError> {
        let api = self.api_for(store)?;
        api.upload_file(local_path, file_name).await
    }
}
