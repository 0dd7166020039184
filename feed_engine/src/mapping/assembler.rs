use serde_json::Value;
use shopify_tools::{ShopifyProduct, Variant};

use crate::{
    config::{ChannelMapping, OPTION_FIELDS},
    feed_types::{FeedField, FeedItem, Store},
    mapping::{
        records::{product_record, store_record, variant_record},
        resolver::{ResolveContext, Resolved},
    },
};

/// A FeedItem together with the number of source paths that found nothing while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedItem {
    pub item: FeedItem,
    pub misses: usize,
}

/// All items of one channel, in product and variant order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledFeed {
    pub channel: String,
    pub items: Vec<FeedItem>,
    pub misses: usize,
}

/// Evaluates every field of `mapping` for one variant. Each declared field appears in the item exactly once, in
/// declaration order; lookups that fail leave the value empty. `size` and `color` take the variant's option value when
/// it has one, and only fall back to the configured expression otherwise.
pub fn map_variant(product: &ShopifyProduct, variant: &Variant, store: &Store, mapping: &ChannelMapping) -> MappedItem {
    let product_rec = product_record(product);
    let variant_rec = variant_record(product, variant);
    let store_rec = store_record(store);
    map_records(&ResolveContext::new(&product_rec, &variant_rec, &store_rec), mapping)
}

fn map_records(ctx: &ResolveContext<'_>, mapping: &ChannelMapping) -> MappedItem {
    let mut misses = 0;
    let fields = mapping
        .fields
        .iter()
        .map(|field| {
            let resolved = option_value(ctx, &field.name).unwrap_or_else(|| ctx.evaluate(&field.expression));
            misses += resolved.misses;
            FeedField { name: field.name.clone(), value: resolved.text }
        })
        .collect();
    MappedItem { item: FeedItem::new(fields), misses }
}

fn option_value(ctx: &ResolveContext<'_>, field: &str) -> Option<Resolved> {
    if !OPTION_FIELDS.contains(&field) {
        return None;
    }
    let value = ctx.variant.get(field)?.as_str()?;
    Some(Resolved { text: value.to_string(), misses: 0 })
}

/// Maps a store's products into feeds. The store record is built once and shared by every item.
pub struct FeedAssembler {
    store: Value,
}

impl FeedAssembler {
    pub fn new(store: &Store) -> Self {
        Self { store: store_record(store) }
    }

    /// Builds the feed of every channel in `mappings` in a single pass over the products, so that each product and
    /// variant record is only built once. The result has one entry per mapping, in the same order.
    pub fn assemble(&self, products: &[ShopifyProduct], mappings: &[&ChannelMapping]) -> Vec<AssembledFeed> {
        let mut feeds = mappings
            .iter()
            .map(|m| AssembledFeed { channel: m.name.clone(), ..Default::default() })
            .collect::<Vec<AssembledFeed>>();
        for product in products {
            let product_rec = product_record(product);
            for variant in &product.variants {
                let variant_rec = variant_record(product, variant);
                let ctx = ResolveContext::new(&product_rec, &variant_rec, &self.store);
                for (feed, mapping) in feeds.iter_mut().zip(mappings) {
                    let mapped = map_records(&ctx, mapping);
                    feed.misses += mapped.misses;
                    feed.items.push(mapped.item);
                }
            }
        }
        feeds
    }
}

#[cfg(test)]
mod test {
    use feed_common::Secret;
    use shopify_tools::{InventoryPolicy, ProductOption};

    use super::*;
    use crate::config::parse_channel_mappings;

    fn store() -> Store {
        Store {
            name: "FR".into(),
            shop_domain: "bisgaard-fr.myshopify.com".into(),
            access_token: Secret::new("shpat_fr".into()),
            language: "fr".into(),
            currency: "EUR".into(),
            api_version: "2025-10".into(),
        }
    }

    fn products() -> Vec<ShopifyProduct> {
        let variant = |id: i64, quantity: i64| Variant {
            id,
            price: "10.00".into(),
            inventory_quantity: quantity,
            inventory_policy: InventoryPolicy::Deny,
            ..Default::default()
        };
        vec![
            ShopifyProduct { id: 1, title: "one".into(), variants: vec![variant(11, 1), variant(12, 0)], ..Default::default() },
            ShopifyProduct { id: 2, title: "two".into(), variants: vec![], ..Default::default() },
            ShopifyProduct { id: 3, title: "three".into(), variants: vec![variant(31, 5)], ..Default::default() },
        ]
    }

    const MAPPINGS: &str = r#"
channels:
  google:
    fields:
      - id: variant.id
      - item_group_id: id
      - availability: variant.availability
      - link: https://{shop_domain}/products/{handle}?v={variant.color}
  meta:
    fields:
      - id: variant.id
      - title: title
"#;

    #[test]
    fn one_item_per_variant_and_channel() {
        let mappings = parse_channel_mappings(MAPPINGS, "m.yaml").unwrap();
        let selected = mappings.select(&[]).unwrap();
        let feeds = FeedAssembler::new(&store()).assemble(&products(), &selected);
        assert_eq!(feeds.len(), 2);
        let google = &feeds[0];
        assert_eq!(google.channel, "google");
        let ids = google.items.iter().map(|i| i.get("id").unwrap()).collect::<Vec<&str>>();
        assert_eq!(ids, ["11", "12", "31"]);
        let groups = google.items.iter().map(|i| i.get("item_group_id").unwrap()).collect::<Vec<&str>>();
        assert_eq!(groups, ["1", "1", "3"]);
        assert_eq!(google.items[1].get("availability"), Some("out of stock"));
        // None of the products has a color option; a null handle is empty but not a miss.
        assert_eq!(google.misses, 3);
        assert_eq!(google.items[0].get("link"), Some("https://bisgaard-fr.myshopify.com/products/?v="));
        assert_eq!(feeds[1].items[2].get("title"), Some("three"));
        assert_eq!(feeds[1].misses, 0);
    }

    #[test]
    fn map_variant_matches_assemble() {
        let mappings = parse_channel_mappings(MAPPINGS, "m.yaml").unwrap();
        let google = mappings.get("google").unwrap();
        let products = products();
        let mapped = map_variant(&products[2], &products[2].variants[0], &store(), google);
        let feeds = FeedAssembler::new(&store()).assemble(&products, &[google]);
        assert_eq!(mapped.item, feeds[0].items[2]);
        assert_eq!(mapped.misses, 1);
    }

    #[test]
    fn item_group_id_without_variant_product_id() {
        let text = r#"
channels:
  meta:
    fields:
      - id: variant.id
      - item_group_id: variant.product_id
"#;
        let mappings = parse_channel_mappings(text, "m.yaml").unwrap();
        let product: ShopifyProduct =
            serde_json::from_str(r#"{"id": 77, "title": "t", "variants": [{"id": 1, "price": "1.00"}]}"#).unwrap();
        let mapped = map_variant(&product, &product.variants[0], &store(), mappings.get("meta").unwrap());
        assert_eq!(mapped.item.get("item_group_id"), Some("77"));
    }

    #[test]
    fn configured_availability_and_options_are_overridden() {
        let text = r#"
channels:
  google:
    fields:
      - availability: "'in stock'"
      - size: "'one size'"
      - color: product_type
"#;
        let mappings = parse_channel_mappings(text, "m.yaml").unwrap();
        let google = mappings.get("google").unwrap();
        let mut product = products().remove(0);
        product.product_type = Some("Jackets".into());
        product.options = vec![ProductOption { name: "Size".into(), ..Default::default() }];
        product.variants[1].option1 = Some("6Y".into());
        let mapped = map_variant(&product, &product.variants[1], &store(), google);
        assert_eq!(mapped.item.get("availability"), Some("out of stock"));
        assert_eq!(mapped.item.get("size"), Some("6Y"));
        // No color option, so the configured expression is used.
        assert_eq!(mapped.item.get("color"), Some("Jackets"));
        assert_eq!(mapped.misses, 0);
    }
}
