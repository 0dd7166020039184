//! # Feed engine
//!
//! Builds variant-level advertising feeds (Google Shopping, Meta Catalog, or any configured channel) from the
//! products of one or more Shopify stores.
//!
//! The moving parts:
//! * [`config`] loads store credentials and channel mappings from YAML, and runtime settings from the environment.
//! * [`mapping`] evaluates a channel's field expressions against each product/variant pair and produces one
//!   [`FeedItem`] per variant, with the same fields in the same order for every item.
//! * [`availability`] decides whether a variant is in stock, out of stock or available for preorder.
//! * [`xml`] writes (and reads back) the RSS 2.0 documents.
//! * [`output`] stores the documents on disk, plain and gzipped, replacing old files atomically.
//! * [`pipeline`] strings these together per store, with products coming from a [`ProductSource`] and finished feeds
//!   going to a [`FeedUploader`]. [`ShopifyBackend`] implements both against the Shopify Admin API.
pub mod availability;
pub mod config;
pub mod errors;
pub mod feed_types;
pub mod helpers;
pub mod mapping;
pub mod output;
pub mod pipeline;
pub mod traits;
pub mod xml;

mod shopify_backend;

pub use availability::Availability;
pub use errors::{ConfigError, FeedError, XmlError};
pub use feed_types::{FeedField, FeedItem, Store};
pub use pipeline::{ChannelReport, FeedPipeline, StoreRunReport};
pub use shopify_backend::ShopifyBackend;
pub use traits::{FeedUploader, NoUpload, ProductSource};
