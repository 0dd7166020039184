//! JSON views of the typed Shopify records that expressions are evaluated against.
//!
//! The variant record carries a few attributes Shopify doesn't send, so that mappings can refer to them like any
//! other field:
//! * `availability`, see [`Availability`]
//! * one entry per product option, named after the lower-cased option name (`size`, `color`, ...)
//! * `image_src`, the url of the variant's own image, or the product's first image
//!
//! `product_id` is always the owning product's id, whatever the source sent (dumps often leave it out).
use log::*;
use serde::Serialize;
use serde_json::{Map, Value};
use shopify_tools::{ShopifyProduct, Variant};

use crate::{availability::Availability, feed_types::Store};

fn to_record<T: Serialize>(value: &T, what: &str) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!("Could not represent {what} as JSON. All of its fields will be empty. {e}");
        Value::Object(Map::new())
    })
}

pub fn product_record(product: &ShopifyProduct) -> Value {
    to_record(product, &format!("product {}", product.id))
}

pub fn variant_record(product: &ShopifyProduct, variant: &Variant) -> Value {
    let mut record = to_record(variant, &format!("variant {}", variant.id));
    if let Value::Object(map) = &mut record {
        map.insert("product_id".into(), Value::from(product.id));
        map.insert("availability".into(), Value::String(Availability::for_variant(variant).to_string()));
        // Options never shadow real variant attributes; an option called "Price" must not replace the price.
        for (name, value) in product.variant_options(variant) {
            map.entry(name).or_insert_with(|| Value::String(value.to_string()));
        }
        if let Some(image) = product.image_for(variant) {
            map.entry("image_src").or_insert_with(|| Value::String(image.src.clone()));
        }
    }
    record
}

/// The store's public attributes. The access token is never part of the record.
pub fn store_record(store: &Store) -> Value {
    to_record(store, &format!("store {}", store.name))
}
