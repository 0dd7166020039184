#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
};

use feed_common::Secret;
use feed_engine::{
    config::{parse_channel_mappings, ChannelMappings},
    helpers::parse_products_dump,
    FeedUploader,
    ProductSource,
    Store,
};
use shopify_tools::{ShopifyApiError, ShopifyProduct};

pub const BISGAARD_PRODUCTS: &str = include_str!("../data/bisgaard_products.json");
pub const CHANNEL_MAPPINGS: &str = include_str!("../data/channel_mappings.yaml");

pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub fn store(name: &str, language: &str, currency: &str) -> Store {
    Store {
        name: name.to_string(),
        shop_domain: format!("bisgaard-{}.myshopify.com", name.to_lowercase()),
        access_token: Secret::new(format!("shpat_{name}")),
        language: language.to_string(),
        currency: currency.to_string(),
        api_version: "2025-10".to_string(),
    }
}

pub fn bisgaard_products() -> Vec<ShopifyProduct> {
    parse_products_dump(BISGAARD_PRODUCTS).expect("Invalid product fixture")
}

pub fn channel_mappings() -> ChannelMappings {
    parse_channel_mappings(CHANNEL_MAPPINGS, "channel_mappings.yaml").expect("Invalid mapping fixture")
}

/// Serves fixed product lists per store name. Stores without an entry fail with a 401, the way Shopify answers a
/// revoked token.
#[derive(Default)]
pub struct MemorySource {
    products: HashMap<String, Vec<ShopifyProduct>>,
}

impl MemorySource {
    pub fn with_store(mut self, store: &str, products: Vec<ShopifyProduct>) -> Self {
        self.products.insert(store.to_string(), products);
        self
    }
}

impl ProductSource for MemorySource {
    async fn fetch_products(&self, store: &Store) -> Result<Vec<ShopifyProduct>, ShopifyApiError> {
        self.products.get(&store.name).cloned().ok_or_else(|| ShopifyApiError::QueryError {
            status: 401,
            message: "[API] Invalid API key or access token (unrecognized login or wrong password)".into(),
        })
    }
}

/// Records uploads instead of performing them. File names listed in `failing` fail.
#[derive(Default)]
pub struct RecordingUploader {
    pub uploads: RefCell<Vec<(String, PathBuf, String)>>,
    pub failing: Vec<String>,
}

impl FeedUploader for RecordingUploader {
    async fn upload(&self, store: &Store, local_path: &Path, file_name: &str) -> Result<String, ShopifyApiError> {
        if self.failing.iter().any(|f| f == file_name) {
            return Err(ShopifyApiError::UploadError(format!("Could not create a staged upload for {file_name}")));
        }
        self.uploads.borrow_mut().push((store.name.clone(), local_path.to_path_buf(), file_name.to_string()));
        Ok(format!("https://cdn.shopify.com/s/files/1/0000/{file_name}"))
    }
}
