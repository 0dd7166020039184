//! RSS 2.0 feed documents.
mod reader;
mod writer;

pub use reader::{read_feed, read_feed_items, ParsedFeed};
pub use writer::write_feed;

use crate::feed_types::Store;

/// The `<channel>` header of a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedHeader {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl FeedHeader {
    pub fn for_channel(store: &Store, channel: &str) -> Self {
        Self {
            title: format!("{} Product Feed - {}", store.name, channel.to_uppercase()),
            link: format!("https://{}", store.shop_domain),
            description: format!("Product feed for {channel}"),
        }
    }
}
