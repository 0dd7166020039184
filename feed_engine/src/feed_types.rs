use std::fmt::Display;

use feed_common::Secret;
use serde::Serialize;

/// A Shopify store to generate feeds for. Built once from the credentials file and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub name: String,
    /// e.g. "my-shop.myshopify.com", without scheme or trailing slash.
    pub shop_domain: String,
    #[serde(skip)]
    pub access_token: Secret<String>,
    pub language: String,
    pub currency: String,
    pub api_version: String,
}

impl Store {
    /// `{channel}_{language}_{currency}`, the stem shared by every file generated for this store and channel.
    pub fn feed_file_stem(&self, channel: &str) -> String {
        format!("{channel}_{}_{}", self.language, self.currency)
    }
}

impl Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {}/{})", self.name, self.shop_domain, self.language, self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedField {
    pub name: String,
    pub value: String,
}

/// One feed entry, i.e. one variant as seen by a channel. Fields keep the order of the channel mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    fields: Vec<FeedField>,
}

impl FeedItem {
    pub fn new(fields: Vec<FeedField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FeedField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for FeedItem {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(name, value)| FeedField { name, value }).collect())
    }
}
