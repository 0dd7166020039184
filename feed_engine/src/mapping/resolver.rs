use serde_json::Value;

use crate::mapping::expression::{Expression, FieldPath, PathRoot, Segment, TemplatePart};

/// The read-only records an expression is evaluated against. See [`crate::mapping::records`] for how they are built.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub product: &'a Value,
    pub variant: &'a Value,
    pub store: &'a Value,
}

/// The text an expression produced, and how many of its paths found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    pub misses: usize,
}

impl<'a> ResolveContext<'a> {
    pub fn new(product: &'a Value, variant: &'a Value, store: &'a Value) -> Self {
        Self { product, variant, store }
    }

    /// Walks `path` into the matching record. Missing keys, out-of-range indices and traversal into scalars all give
    /// `None`.
    pub fn lookup(&self, path: &FieldPath) -> Option<&'a Value> {
        let record = match path.root() {
            PathRoot::Product => self.product,
            PathRoot::Variant => self.variant,
            PathRoot::Store => self.store,
        };
        path.segments().iter().try_fold(record, |value, segment| match segment {
            Segment::Key(k) => value.as_object()?.get(k),
            Segment::Index(i) => value.as_array()?.get(*i),
        })
    }

    pub fn evaluate(&self, expression: &Expression) -> Resolved {
        match expression {
            Expression::Literal(s) => Resolved { text: s.clone(), misses: 0 },
            Expression::Path(path) => self.resolve_path(path),
            Expression::Template(parts) => parts.iter().fold(Resolved::default(), |mut acc, part| {
                match part {
                    TemplatePart::Text(t) => acc.text.push_str(t),
                    TemplatePart::Placeholder(path) => {
                        let resolved = self.resolve_path(path);
                        acc.text.push_str(&resolved.text);
                        acc.misses += resolved.misses;
                    },
                }
                acc
            }),
        }
    }

    fn resolve_path(&self, path: &FieldPath) -> Resolved {
        match self.lookup(path) {
            Some(value) => Resolved { text: value_to_text(value), misses: 0 },
            None => Resolved { text: String::new(), misses: 1 },
        }
    }
}

/// Renders a JSON value as feed text. Numbers keep their JSON rendering, so `12` never becomes `12.0`.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => {
            items.iter().map(value_to_text).collect::<Vec<String>>().join(",")
        },
        other => other.to_string(),
    }
}
