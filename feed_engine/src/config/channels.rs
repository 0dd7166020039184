//! Channel mappings, loaded from `channel_mappings.yaml`.
//!
//! Each channel lists its output fields in order, each with a source expression. The whole document is validated at
//! load time; any error aborts the run before a single request is made.
use std::{collections::HashSet, fs, path::Path};

use log::*;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::{
    errors::ConfigError,
    mapping::expression::{Expression, FieldPath, PathRoot, Segment, TemplatePart},
};

pub const GOOGLE_CHANNEL: &str = "google";
pub const GOOGLE_NAMESPACE_PREFIX: &str = "g";
pub const GOOGLE_NAMESPACE_URI: &str = "http://base.google.com/ns/1.0";
/// Google Shopping attributes that are written with the `g:` prefix.
pub const GOOGLE_NAMESPACED_FIELDS: [&str; 16] = [
    "id",
    "title",
    "description",
    "link",
    "image_link",
    "availability",
    "price",
    "brand",
    "gtin",
    "mpn",
    "condition",
    "item_group_id",
    "color",
    "size",
    "sale_price",
    "additional_image_link",
];

/// Always computed from the variant's inventory, whatever expression is configured for it.
pub const AVAILABILITY_FIELD: &str = "availability";
/// Filled from the variant's product option of the same name whenever the variant has one.
pub const OPTION_FIELDS: [&str; 2] = ["size", "color"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub name: String,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNamespace {
    pub prefix: String,
    pub uri: String,
    /// Fields written with the prefix. `None` prefixes every field.
    pub fields: Option<Vec<String>>,
}

impl XmlNamespace {
    pub fn google() -> Self {
        Self {
            prefix: GOOGLE_NAMESPACE_PREFIX.to_string(),
            uri: GOOGLE_NAMESPACE_URI.to_string(),
            fields: Some(GOOGLE_NAMESPACED_FIELDS.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn applies_to(&self, field: &str) -> bool {
        self.fields.as_ref().map_or(true, |fields| fields.iter().any(|f| f == field))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub name: String,
    pub fields: Vec<FieldMapping>,
    pub namespace: Option<XmlNamespace>,
}

impl ChannelMapping {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// The element name of `field` in the XML output, e.g. `g:price`.
    pub fn element_name(&self, field: &str) -> String {
        match &self.namespace {
            Some(ns) if ns.applies_to(field) => format!("{}:{field}", ns.prefix),
            _ => field.to_string(),
        }
    }
}

/// All configured channels, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMappings {
    channels: Vec<ChannelMapping>,
}

impl ChannelMappings {
    pub fn new(channels: Vec<ChannelMapping>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[ChannelMapping] {
        &self.channels
    }

    pub fn get(&self, name: &str) -> Option<&ChannelMapping> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The channels named in `names`, in document order. An empty list selects every channel.
    pub fn select(&self, names: &[String]) -> Result<Vec<&ChannelMapping>, ConfigError> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(ConfigError::UnknownChannel(unknown.clone()));
        }
        Ok(self.channels.iter().filter(|c| names.is_empty() || names.contains(&c.name)).collect())
    }
}

#[derive(Debug, Default, Deserialize)]
struct MappingsDocument {
    #[serde(default)]
    channels: Mapping,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(default)]
    fields: Vec<Mapping>,
    namespace: Option<RawNamespace>,
}

#[derive(Debug, Deserialize)]
struct RawNamespace {
    prefix: String,
    uri: String,
    fields: Option<Vec<String>>,
}

pub fn load_channel_mappings(path: &Path) -> Result<ChannelMappings, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io { path: path.display().to_string(), message: e.to_string() })?;
    let mappings = parse_channel_mappings(&text, path.display().to_string().as_str())?;
    info!("🪛️ Loaded {} channels from {}", mappings.len(), path.display());
    Ok(mappings)
}

/// Parses and validates a channel mappings document. Every problem in the document is logged; a single problem is
/// returned as is, several are combined into [`ConfigError::Channels`].
pub fn parse_channel_mappings(text: &str, source: &str) -> Result<ChannelMappings, ConfigError> {
    let doc = serde_yaml::from_str::<MappingsDocument>(text)
        .map_err(|e| ConfigError::Parse { path: source.to_string(), message: e.to_string() })?;
    if doc.channels.is_empty() {
        return Err(ConfigError::Channels(format!("{source} does not define any channels")));
    }
    let mut channels = Vec::with_capacity(doc.channels.len());
    let mut errors = Vec::new();
    for (key, value) in doc.channels {
        match parse_channel(key, value) {
            Ok(channel) => channels.push(channel),
            Err(mut e) => errors.append(&mut e),
        }
    }
    match errors.len() {
        0 => Ok(ChannelMappings::new(channels)),
        1 => Err(errors.remove(0)),
        n => {
            for e in &errors {
                error!("🪛️ {e}");
            }
            let summary = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join("; ");
            Err(ConfigError::Channels(format!("{n} problems found. {summary}")))
        },
    }
}

fn parse_channel(key: Value, value: Value) -> Result<ChannelMapping, Vec<ConfigError>> {
    let name = scalar_text(&key).unwrap_or_default().trim().to_string();
    let channel_err = |message: String| vec![ConfigError::Mapping { channel: name.clone(), field: "-".into(), message }];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(channel_err(format!("'{name}' is not a usable channel name")));
    }
    let raw = serde_yaml::from_value::<RawChannel>(value).map_err(|e| channel_err(e.to_string()))?;
    if raw.fields.is_empty() {
        return Err(channel_err("The channel does not declare any fields".into()));
    }
    let mut errors = Vec::new();
    let mut fields = Vec::new();
    let mut seen = HashSet::new();
    for (field_key, field_value) in raw.fields.into_iter().flatten() {
        let field = scalar_text(&field_key).unwrap_or_default().trim().to_string();
        let err = |message: String| ConfigError::Mapping { channel: name.clone(), field: field.clone(), message };
        if !is_xml_name(&field) {
            errors.push(err(format!("'{field}' is not a valid XML element name")));
            continue;
        }
        if !seen.insert(field.clone()) {
            errors.push(err("The field is declared more than once".into()));
            continue;
        }
        let source = match scalar_text(&field_value) {
            Some(s) => s,
            None => {
                errors.push(err("The field has no source expression".into()));
                continue;
            },
        };
        if field == AVAILABILITY_FIELD {
            let expression = availability_expression();
            if source.trim() != expression.to_string() {
                warn!("🪛️ {name}.{field} is computed from inventory. The configured `{source}` is ignored");
            }
            fields.push(FieldMapping { name: field, expression });
            continue;
        }
        // Bare YAML numbers and booleans are taken literally.
        let expression = if field_value.is_string() { source.parse::<Expression>() } else { Ok(Expression::Literal(source)) };
        match expression {
            Ok(expression) if field == "item_group_id" && !refers_to_product_id(&expression) => errors.push(err(format!(
                "item_group_id must be the product id (e.g. `id`), but it is `{expression}`"
            ))),
            Ok(expression) => fields.push(FieldMapping { name: field, expression }),
            Err(e) => errors.push(err(e.to_string())),
        }
    }
    let namespace = match raw.namespace {
        Some(ns) => {
            if !is_xml_name(&ns.prefix) || ns.uri.trim().is_empty() {
                errors.push(ConfigError::Mapping {
                    channel: name.clone(),
                    field: "-".into(),
                    message: format!("The namespace needs a valid prefix and a uri (got '{}')", ns.prefix),
                });
            }
            Some(XmlNamespace { prefix: ns.prefix.trim().to_string(), uri: ns.uri.trim().to_string(), fields: ns.fields })
        },
        None if name == GOOGLE_CHANNEL => Some(XmlNamespace::google()),
        None => None,
    };
    if !errors.is_empty() {
        return Err(errors);
    }
    debug!("🪛️ Channel {name} maps {} fields", fields.len());
    Ok(ChannelMapping { name, fields, namespace })
}

fn availability_expression() -> Expression {
    Expression::Path(FieldPath::new(PathRoot::Variant, vec![Segment::Key(AVAILABILITY_FIELD.to_string())]))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The grouping id must link every variant to its product.
fn refers_to_product_id(expression: &Expression) -> bool {
    let is_product_id = |path: &FieldPath| {
        path.is_key(PathRoot::Product, "id") || path.is_key(PathRoot::Variant, "product_id")
    };
    match expression {
        Expression::Path(path) => is_product_id(path),
        Expression::Template(parts) => matches!(parts.as_slice(), [TemplatePart::Placeholder(path)] if is_product_id(path)),
        Expression::Literal(_) => false,
    }
}

/// Element names without a prefix: a letter or underscore, followed by letters, digits, `_`, `-` or `.`.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {},
        _ => return false,
    }
    !name.to_ascii_lowercase().starts_with("xml") && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod test {
    use super::*;

    const MAPPINGS: &str = r#"
channels:
  meta:
    fields:
      - id: variant.id
      - item_group_id: id
      - title: title
      - price: "{variant.price} {currency}"
      - inventory: 3
  google:
    fields:
      - id: variant.id
      - item_group_id: "{id}"
      - link: https://{shop_domain}/products/{handle}?variant={variant.id}
      - condition: "'new'"
      - custom_label_0: product_type
"#;

    #[test]
    fn channels_keep_document_order() {
        let mappings = parse_channel_mappings(MAPPINGS, "channel_mappings.yaml").unwrap();
        let names = mappings.channels().iter().map(|c| c.name.as_str()).collect::<Vec<&str>>();
        assert_eq!(names, ["meta", "google"]);
        let meta = mappings.get("meta").unwrap();
        assert_eq!(meta.field_names().collect::<Vec<&str>>(), ["id", "item_group_id", "title", "price", "inventory"]);
        assert_eq!(meta.fields[4].expression, Expression::literal("3"));
        assert!(meta.namespace.is_none());
        assert_eq!(meta.element_name("price"), "price");
    }

    #[test]
    fn google_gets_its_namespace_by_default() {
        let mappings = parse_channel_mappings(MAPPINGS, "channel_mappings.yaml").unwrap();
        let google = mappings.get("google").unwrap();
        assert_eq!(google.namespace, Some(XmlNamespace::google()));
        assert_eq!(google.element_name("item_group_id"), "g:item_group_id");
        assert_eq!(google.element_name("custom_label_0"), "custom_label_0");
        assert_eq!(google.fields[3].expression, Expression::literal("new"));
    }

    #[test]
    fn custom_namespaces() {
        let text = r#"
channels:
  pinterest:
    namespace:
      prefix: p
      uri: https://example.com/ns
    fields:
      - id: variant.id
"#;
        let mappings = parse_channel_mappings(text, "m.yaml").unwrap();
        let pinterest = mappings.get("pinterest").unwrap();
        assert_eq!(pinterest.element_name("id"), "p:id");
    }

    #[test]
    fn malformed_expressions_name_channel_and_field() {
        let text = r#"
channels:
  google:
    fields:
      - id: variant.id
      - price: "{variant.price {currency}"
"#;
        match parse_channel_mappings(text, "m.yaml").unwrap_err() {
            ConfigError::Mapping { channel, field, .. } => {
                assert_eq!(channel, "google");
                assert_eq!(field, "price");
            },
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn several_problems_are_combined() {
        let text = r#"
channels:
  google:
    fields:
      - id: variant.id
      - id: variant.sku
      - item_group_id: variant.id
      - "1st": title
      - empty:
"#;
        match parse_channel_mappings(text, "m.yaml").unwrap_err() {
            ConfigError::Channels(message) => {
                assert!(message.starts_with("4 problems found"), "{message}");
                assert!(message.contains("item_group_id must be the product id"));
            },
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn availability_is_always_derived() {
        let text = r#"
channels:
  google:
    fields:
      - availability: 'variant.inventory_quantity > 0 ? "in stock" : "out of stock"'
  meta:
    fields:
      - availability: "'in stock'"
"#;
        let mappings = parse_channel_mappings(text, "m.yaml").unwrap();
        for channel in mappings.channels() {
            assert_eq!(channel.fields[0].expression.to_string(), "variant.availability", "{}", channel.name);
        }
    }

    #[test]
    fn conditionals_are_rejected_elsewhere() {
        let text = r#"
channels:
  google:
    fields:
      - custom_label_0: "variant.inventory_quantity > 5 ? 'plenty' : 'few'"
"#;
        match parse_channel_mappings(text, "m.yaml").unwrap_err() {
            ConfigError::Mapping { field, message, .. } => {
                assert_eq!(field, "custom_label_0");
                assert!(message.contains("Conditional expressions are not supported"), "{message}");
            },
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn channel_selection() {
        let mappings = parse_channel_mappings(MAPPINGS, "channel_mappings.yaml").unwrap();
        assert_eq!(mappings.select(&[]).unwrap().len(), 2);
        let selected = mappings.select(&["google".to_string()]).unwrap();
        assert_eq!(selected[0].name, "google");
        assert_eq!(mappings.select(&["tiktok".to_string()]).unwrap_err(), ConfigError::UnknownChannel("tiktok".into()));
    }

    #[test]
    fn empty_documents_are_rejected() {
        assert!(matches!(parse_channel_mappings("channels: {}", "m.yaml"), Err(ConfigError::Channels(_))));
        assert!(matches!(parse_channel_mappings("channels: [", "m.yaml"), Err(ConfigError::Parse { .. })));
    }
}
