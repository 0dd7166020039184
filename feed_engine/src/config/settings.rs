use std::{path::PathBuf, time::Duration};

use feed_common::{env_or_default, parse_boolean_flag};
use log::*;
use shopify_tools::{RetryPolicy, ShopifyConfig, DEFAULT_API_VERSION, MAX_PAGE_SIZE};

use crate::feed_types::Store;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_MAPPINGS_PATH: &str = "channel_mappings.yaml";
const DEFAULT_OUTPUT_DIR: &str = "feeds";
const DEFAULT_PAGE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Where and how feed files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub output_dir: PathBuf,
    /// Every `.xml.gz` of the run is also copied here, flattened to `{store}_{file}`.
    pub publish_dir: Option<PathBuf>,
    pub compress: bool,
    pub keep_xml: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR), publish_dir: None, compress: true, keep_xml: true }
    }
}

impl OutputOptions {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self { output_dir: output_dir.into(), ..Default::default() }
    }

    /// Turning off both the plain and the compressed file would write nothing at all, so the plain file is kept.
    pub fn normalized(mut self) -> Self {
        if !self.compress && !self.keep_xml {
            warn!("🪛️ Both compression and plain XML output are disabled. Writing plain XML files anyway.");
            self.keep_xml = true;
        }
        self
    }
}

/// Runtime settings. Each one can be set with an environment variable and overridden on the command line.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub config_path: PathBuf,
    pub mappings_path: PathBuf,
    pub output: OutputOptions,
    /// Used for stores that don't set their own `api_version`.
    pub api_version: String,
    pub page_size: u32,
    pub page_delay: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            mappings_path: PathBuf::from(DEFAULT_MAPPINGS_PATH),
            output: OutputOptions::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: MAX_PAGE_SIZE,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl FeedSettings {
    pub fn from_env_or_default() -> Self {
        let path = |name: &str, default: &str| PathBuf::from(env_or_default(name, default.to_string()));
        let publish_dir = std::env::var("FEED_PUBLISH_DIR").ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let output = OutputOptions {
            output_dir: path("FEED_OUTPUT_DIR", DEFAULT_OUTPUT_DIR),
            publish_dir: publish_dir.map(PathBuf::from),
            compress: parse_boolean_flag(std::env::var("FEED_COMPRESS").ok(), true),
            keep_xml: parse_boolean_flag(std::env::var("FEED_KEEP_XML").ok(), true),
        };
        let page_size = env_or_default("FEED_PAGE_SIZE", MAX_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            warn!("🪛️ FEED_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}. {page_size} will be clamped.");
        }
        Self {
            config_path: path("FEED_CONFIG_PATH", DEFAULT_CONFIG_PATH),
            mappings_path: path("FEED_MAPPINGS_PATH", DEFAULT_MAPPINGS_PATH),
            output,
            api_version: env_or_default("FEED_SHOPIFY_API_VERSION", DEFAULT_API_VERSION.to_string()),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            page_delay: Duration::from_millis(env_or_default("FEED_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS)),
            max_retries: env_or_default("FEED_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(env_or_default("FEED_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)),
        }
    }

    /// `FEED_MAX_RETRIES` counts retries, so the policy allows one more attempt than that.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries.saturating_add(1), self.retry_delay)
    }

    /// The API client configuration for one store.
    pub fn shopify_config(&self, store: &Store) -> ShopifyConfig {
        ShopifyConfig::new(&store.shop_domain, store.access_token.clone(), &store.api_version)
            .with_page_size(self.page_size)
            .with_page_delay(self.page_delay)
            .with_retry_policy(self.retry_policy())
    }
}
