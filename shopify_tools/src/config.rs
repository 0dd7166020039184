use std::time::Duration;

use feed_common::Secret;

use crate::RetryPolicy;

pub const DEFAULT_API_VERSION: &str = "2025-10";
/// The largest page the REST products endpoint will hand out.
pub const MAX_PAGE_SIZE: u32 = 250;
const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_UPLOAD_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// The shop's myshopify domain, e.g. "my-shop.myshopify.com"
    pub shop: String,
    pub admin_access_token: Secret<String>,
    pub api_version: String,
    pub page_size: u32,
    /// Pause between two page requests. Shopify allows roughly two REST calls per second per app.
    pub page_delay: Duration,
    /// Pause after each file upload, for the same reason.
    pub upload_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop: String::default(),
            admin_access_token: Secret::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: MAX_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
            upload_delay: DEFAULT_UPLOAD_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

impl ShopifyConfig {
    pub fn new(shop: &str, admin_access_token: Secret<String>, api_version: &str) -> Self {
        Self { shop: shop.to_string(), admin_access_token, api_version: api_version.to_string(), ..Default::default() }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
