use serde::Deserialize;
use shopify_tools::ShopifyProduct;

/// Reads a product dump in either of the shapes Shopify hands out: the raw `{"products": [...]}` response body, or
/// a bare array of products.
pub fn parse_products_dump(json: &str) -> Result<Vec<ShopifyProduct>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Dump {
        Page { products: Vec<ShopifyProduct> },
        List(Vec<ShopifyProduct>),
    }
    serde_json::from_str::<Dump>(json).map(|dump| match dump {
        Dump::Page { products } => products,
        Dump::List(products) => products,
    })
}

/// `1536` -> `1.5kB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{size:.1}{}", UNITS[unit])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn product_dumps() {
        let page = r#"{"products": [{"id": 1, "title": "a", "variants": [{"id": 11, "price": "1.00"}]}]}"#;
        let list = r#"[{"id": 1, "title": "a"}, {"id": 2, "title": "b"}]"#;
        assert_eq!(parse_products_dump(page).unwrap()[0].variants[0].id, 11);
        assert_eq!(parse_products_dump(list).unwrap().len(), 2);
        assert!(parse_products_dump(r#"{"orders": []}"#).is_err());
    }

    #[test]
    fn sizes() {
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(1536), "1.5kB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0MB");
    }
}
