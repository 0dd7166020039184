use std::fmt::Display;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::{de_optional_price, de_price};

/// A product as returned by the Admin REST `products.json` endpoint.
///
/// Only the attributes the feed engine relies on are typed. Everything else the API sends is kept in `extra` so that
/// channel mappings can still reach it by path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    pub title: String,
    pub handle: Option<String>,
    pub body_html: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    /// Comma separated, as the REST API delivers them.
    pub tags: Option<String>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    #[serde(default)]
    pub product_id: i64,
    pub title: Option<String>,
    #[serde(deserialize_with = "de_price")]
    pub price: String,
    #[serde(default, deserialize_with = "de_optional_price")]
    pub compare_at_price: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    #[serde(default)]
    pub inventory_quantity: i64,
    #[serde(default)]
    pub inventory_policy: InventoryPolicy,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub image_id: Option<i64>,
    pub position: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    #[serde(default)]
    pub product_id: i64,
    pub position: Option<i64>,
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[serde(default)]
    pub variant_ids: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: Option<i64>,
    pub name: String,
    pub position: Option<i64>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Whether Shopify lets the variant be sold once its tracked inventory reaches zero. A missing or unrecognised policy
/// is read as `deny`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum InventoryPolicy {
    #[default]
    Deny,
    Continue,
}

impl From<Option<String>> for InventoryPolicy {
    fn from(value: Option<String>) -> Self {
        match value.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "continue" => Self::Continue,
            _ => Self::Deny,
        }
    }
}

impl From<InventoryPolicy> for String {
    fn from(value: InventoryPolicy) -> Self {
        value.to_string()
    }
}

impl Display for InventoryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deny => f.write_str("deny"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

impl Variant {
    fn option_values(&self) -> [Option<&str>; 3] {
        [self.option1.as_deref(), self.option2.as_deref(), self.option3.as_deref()]
    }
}

impl ShopifyProduct {
    /// Pairs each of the variant's option values with the lower-cased name of the product option at the same
    /// position, e.g. `[("size", "4Y"), ("color", "caramel")]`. Options without a value are skipped.
    pub fn variant_options<'a>(&'a self, variant: &'a Variant) -> Vec<(String, &'a str)> {
        variant
            .option_values()
            .into_iter()
            .zip(self.options.iter())
            .filter_map(|(value, option)| value.map(|v| (option.name.trim().to_lowercase(), v)))
            .collect()
    }

    /// The image assigned to the variant, falling back to the product's first image.
    pub fn image_for(&self, variant: &Variant) -> Option<&ProductImage> {
        variant
            .image_id
            .and_then(|id| self.images.iter().find(|img| img.id == id))
            .or_else(|| self.images.iter().find(|img| img.variant_ids.contains(&variant.id)))
            .or_else(|| self.images.first())
    }
}
