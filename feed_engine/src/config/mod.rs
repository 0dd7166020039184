//! Configuration: store credentials and channel mappings from YAML, runtime settings from the environment.
mod channels;
mod settings;
mod stores;

pub use channels::{
    load_channel_mappings,
    parse_channel_mappings,
    ChannelMapping,
    ChannelMappings,
    FieldMapping,
    XmlNamespace,
    AVAILABILITY_FIELD,
    GOOGLE_CHANNEL,
    GOOGLE_NAMESPACED_FIELDS,
    GOOGLE_NAMESPACE_PREFIX,
    GOOGLE_NAMESPACE_URI,
    OPTION_FIELDS,
};
pub use settings::{FeedSettings, OutputOptions};
pub use stores::{load_stores, normalize_shop_domain, parse_stores, parse_stores_with, select_stores, StoreEntry};
