use shopify_tools::ShopifyApiError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Could not read {path}. {message}")]
    Io { path: String, message: String },
    #[error("Could not parse {path}. {message}")]
    Parse { path: String, message: String },
    #[error("Store {store} is misconfigured. {message}")]
    Store { store: String, message: String },
    #[error("Channel {channel}, field {field}: {message}")]
    Mapping { channel: String, field: String, message: String },
    #[error("Channel {0} is not defined in the channel mappings")]
    UnknownChannel(String),
    #[error("Invalid channel mappings. {0}")]
    Channels(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("XML error. {0}")]
pub struct XmlError(pub String);

impl From<quick_xml::Error> for XmlError {
    fn from(e: quick_xml::Error) -> Self {
        Self(e.to_string())
    }
}

/// Everything that can stop one store's run. Each variant carries enough context to tell which store (and channel)
/// was affected.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Could not fetch products for store {store}. {source}")]
    Fetch {
        store: String,
        #[source]
        source: ShopifyApiError,
    },
    #[error("Could not serialize the {channel} feed for store {store}. {source}")]
    Serialization {
        store: String,
        channel: String,
        #[source]
        source: XmlError,
    },
    #[error("Could not write the {channel} feed for store {store}. {source}")]
    Write {
        store: String,
        channel: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not upload {file} for store {store}. {source}")]
    Upload {
        store: String,
        file: String,
        #[source]
        source: ShopifyApiError,
    },
}

