use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Rate limited by Shopify. Retry after {0:?}")]
    RateLimited(Option<Duration>),
    #[error("Network error talking to Shopify: {0}")]
    Transport(String),
    #[error("Gave up after {attempts} attempts. Last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error("Invalid GraphQL query: {0}")]
    InvalidGraphQL(String),
    #[error("GraphQL query failed: {0}")]
    GraphQLError(String),
    #[error("The response contained no data")]
    EmptyResponse,
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
    #[error("File upload failed: {0}")]
    UploadError(String),
    #[error("Could not read file for upload. {0}")]
    IOError(#[from] std::io::Error),
}

impl ShopifyApiError {
    /// Transient failures that are worth another attempt: throttling, 5xx responses and transport hiccups.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Transport(_) => true,
            Self::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            Self::Transport(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ShopifyApiError::RateLimited(None).is_retryable());
        assert!(ShopifyApiError::Transport("connection reset".into()).is_retryable());
        assert!(ShopifyApiError::QueryError { status: 503, message: "busy".into() }.is_retryable());
        assert!(!ShopifyApiError::QueryError { status: 401, message: "bad token".into() }.is_retryable());
        assert!(!ShopifyApiError::JsonError("eof".into()).is_retryable());
    }
}
