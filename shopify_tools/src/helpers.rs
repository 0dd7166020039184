use std::sync::OnceLock;

use log::*;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ShopifyApiError;

/// Shopify uses floating point number expressed as strings. Returns the amount in cents.
pub fn parse_shopify_price(price: &str) -> Result<i64, ShopifyApiError> {
    let price = price.trim();
    let (negative, digits) = match price.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, price),
    };
    let mut parts = digits.split('.');
    let whole_units = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShopifyApiError::InvalidCurrencyAmount(price.to_string()))?
        .parse::<i64>()
        .map_err(|e| ShopifyApiError::InvalidCurrencyAmount(format!("Invalid price value: {price}. {e}.")))?;
    let cents = match parts.next() {
        None => 0,
        Some(s) if s.len() == 1 => 10 * parse_cents(s, price)?,
        Some(s) if s.len() == 2 => parse_cents(s, price)?,
        Some(_) => return Err(ShopifyApiError::InvalidCurrencyAmount(format!("Too many decimals: {price}"))),
    };
    if parts.next().is_some() {
        return Err(ShopifyApiError::InvalidCurrencyAmount(price.to_string()));
    }
    let total = 100 * whole_units + cents;
    Ok(if negative { -total } else { total })
}

fn parse_cents(s: &str, price: &str) -> Result<i64, ShopifyApiError> {
    s.parse::<i64>().map_err(|e| ShopifyApiError::InvalidCurrencyAmount(format!("Invalid price value: {price}. {e}.")))
}

/// Formats an amount in cents using the two-decimal convention, e.g. `6995` -> `69.95`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Prices arrive as strings from the REST API, but fixtures and other sources sometimes send bare JSON numbers. Both
/// are normalised to two decimals so that `69.9` renders as `69.90`. A string that isn't a plain amount is kept as it
/// is.
pub fn de_price<'de, D>(d: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(d)?;
    price_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a price string or number, got {value}")))
}

pub fn de_optional_price<'de, D>(d: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(d)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => price_from_value(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a price string or number, got {v}"))),
    }
}

fn price_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(parse_shopify_price(s).map(format_cents).unwrap_or_else(|e| {
            warn!("Keeping price {s:?} as is. {e}");
            s.trim().to_string()
        })),
        Value::Number(n) => {
            let cents = match n.as_i64() {
                Some(whole) => whole.checked_mul(100)?,
                None => (n.as_f64()? * 100.0).round() as i64,
            };
            Some(format_cents(cents))
        },
        _ => None,
    }
}

/// Extracts the `rel="next"` target from a REST `Link` header, e.g.
/// `<https://shop/admin/api/2025-10/products.json?page_info=abc>; rel="next"`.
pub fn next_page_url(link_header: &str) -> Option<String> {
    static NEXT_LINK: OnceLock<Regex> = OnceLock::new();
    let re = NEXT_LINK.get_or_init(|| Regex::new(r#"<([^>]+)>;\s*rel="?next"?"#).unwrap());
    re.captures(link_header).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_prices() {
        assert_eq!(parse_shopify_price("69.95").unwrap(), 6995);
        assert_eq!(parse_shopify_price("69.9").unwrap(), 6990);
        assert_eq!(parse_shopify_price("12").unwrap(), 1200);
        assert_eq!(parse_shopify_price("-3.05").unwrap(), -305);
        assert!(parse_shopify_price("1.234").is_err());
        assert!(parse_shopify_price("abc").is_err());
        assert!(parse_shopify_price("").is_err());
    }

    #[test]
    fn format_prices() {
        assert_eq!(format_cents(6995), "69.95");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-305), "-3.05");
    }

    #[test]
    fn prices_are_normalised_to_two_decimals() {
        #[derive(Deserialize)]
        struct P {
            #[serde(deserialize_with = "de_price")]
            price: String,
            #[serde(default, deserialize_with = "de_optional_price")]
            compare_at_price: Option<String>,
        }
        let p: P = serde_json::from_str(r#"{"price": 69.95, "compare_at_price": null}"#).unwrap();
        assert_eq!(p.price, "69.95");
        assert_eq!(p.compare_at_price, None);
        let p: P = serde_json::from_str(r#"{"price": 69.9, "compare_at_price": 80}"#).unwrap();
        assert_eq!(p.price, "69.90");
        assert_eq!(p.compare_at_price.as_deref(), Some("80.00"));
        let p: P = serde_json::from_str(r#"{"price": "69.95"}"#).unwrap();
        assert_eq!(p.price, "69.95");
        let p: P = serde_json::from_str(r#"{"price": " 69.9", "compare_at_price": "80"}"#).unwrap();
        assert_eq!(p.price, "69.90");
        assert_eq!(p.compare_at_price.as_deref(), Some("80.00"));
        let p: P = serde_json::from_str(r#"{"price": "1.234"}"#).unwrap();
        assert_eq!(p.price, "1.234");
        assert!(serde_json::from_str::<P>(r#"{"price": true}"#).is_err());
    }

    #[test]
    fn link_header_next_page() {
        let header = r#"<https://shop.myshopify.com/admin/api/2025-10/products.json?limit=250&page_info=prev1>; rel="previous", <https://shop.myshopify.com/admin/api/2025-10/products.json?limit=250&page_info=next2>; rel="next""#;
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://shop.myshopify.com/admin/api/2025-10/products.json?limit=250&page_info=next2")
        );
        let last_page = r#"<https://shop.myshopify.com/admin/api/2025-10/products.json?page_info=prev1>; rel="previous""#;
        assert_eq!(next_page_url(last_page), None);
        assert_eq!(next_page_url(""), None);
    }
}
