//! The source-expression language of channel mappings.
//!
//! Three forms exist:
//! * a static literal, wrapped in single or double quotes: `'new'`
//! * a direct path: `variant.price`, `images[0].src`, `store.currency`
//! * a template with `{path}` placeholders: `https://{shop_domain}/products/{handle}?variant={variant.id}`
//!
//! Expressions are parsed once, when the channel mappings are loaded, so a typo in the configuration surfaces before
//! any product is fetched.
use std::{fmt::Display, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("The expression is empty")]
    Empty,
    #[error("Unexpected '}}' at position {0}")]
    UnexpectedClosingBrace(usize),
    #[error("Placeholders cannot be nested (position {0})")]
    NestedPlaceholder(usize),
    #[error("The placeholder opened at position {0} is never closed")]
    UnclosedPlaceholder(usize),
    #[error("Empty placeholder at position {0}")]
    EmptyPlaceholder(usize),
    #[error("'{0}' contains an empty path segment")]
    EmptySegment(String),
    #[error("'{0}' contains an invalid array index")]
    InvalidIndex(String),
    #[error("'{path}' contains the illegal character {ch:?}")]
    IllegalCharacter { path: String, ch: char },
    #[error("'{0}' must name a field, e.g. {0}.id")]
    MissingField(String),
    #[error("Conditional expressions are not supported ('{0}'). Use `variant.availability` for stock status")]
    Conditional(String),
}

/// Which record a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRoot {
    Product,
    Variant,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    root: PathRoot,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn new(root: PathRoot, segments: Vec<Segment>) -> Self {
        Self { root, segments }
    }

    pub fn root(&self) -> PathRoot {
        self.root
    }

    /// Segments below the root record.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True if the path is exactly `key` on the given root, e.g. the product's `id`.
    pub fn is_key(&self, root: PathRoot, key: &str) -> bool {
        self.root == root && matches!(self.segments.as_slice(), [Segment::Key(k)] if k == key)
    }
}

/// Bare names that resolve against the store for compatibility with older mapping files.
const STORE_SHORTHANDS: [(&str, &str); 4] =
    [("shop_domain", "shop_domain"), ("language", "language"), ("currency", "currency"), ("store_name", "name")];

impl FromStr for FieldPath {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        if path.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let mut segments = Vec::new();
        for part in path.split('.') {
            parse_segment(part, path, &mut segments)?;
        }
        let root = match segments.first() {
            Some(Segment::Key(k)) if k == "variant" => PathRoot::Variant,
            Some(Segment::Key(k)) if k == "store" => PathRoot::Store,
            _ => PathRoot::Product,
        };
        let rest = if root == PathRoot::Product { segments } else { segments.split_off(1) };
        if root != PathRoot::Product && !matches!(rest.first(), Some(Segment::Key(_))) {
            let name = if root == PathRoot::Variant { "variant" } else { "store" };
            return Err(ExpressionError::MissingField(name.to_string()));
        }
        if let [Segment::Key(key)] = rest.as_slice() {
            if root == PathRoot::Product {
                if let Some((_, field)) = STORE_SHORTHANDS.iter().find(|(name, _)| name == key) {
                    return Ok(Self::new(PathRoot::Store, vec![Segment::Key(field.to_string())]));
                }
            }
        }
        Ok(Self::new(root, rest))
    }
}

/// Parses `name`, `name[0]` or `name[0][1]` and appends the result to `segments`.
fn parse_segment(part: &str, path: &str, segments: &mut Vec<Segment>) -> Result<(), ExpressionError> {
    let (name, mut indices) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };
    if name.is_empty() {
        return Err(ExpressionError::EmptySegment(path.to_string()));
    }
    if let Some(ch) = name.chars().find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '-')) {
        return Err(ExpressionError::IllegalCharacter { path: path.to_string(), ch });
    }
    segments.push(Segment::Key(name.to_string()));
    while !indices.is_empty() {
        let close = indices.find(']').ok_or_else(|| ExpressionError::InvalidIndex(path.to_string()))?;
        let index = indices[1..close].parse::<usize>().map_err(|_| ExpressionError::InvalidIndex(path.to_string()))?;
        segments.push(Segment::Index(index));
        indices = &indices[close + 1..];
        if !indices.is_empty() && !indices.starts_with('[') {
            return Err(ExpressionError::InvalidIndex(path.to_string()));
        }
    }
    Ok(())
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.root {
            PathRoot::Product => {},
            PathRoot::Variant => f.write_str("variant")?,
            PathRoot::Store => f.write_str("store")?,
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 && self.root == PathRoot::Product => f.write_str(k)?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Text(String),
    Placeholder(FieldPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Used verbatim. Never looks at the records.
    Literal(String),
    Path(FieldPath),
    Template(Vec<TemplatePart>),
}

impl Expression {
    pub fn literal<S: Into<String>>(value: S) -> Self {
        Self::Literal(value.into())
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ExpressionError::Empty);
        }
        if let Some(literal) = strip_quotes(s) {
            return Ok(Self::Literal(literal.to_string()));
        }
        if is_conditional(s) {
            return Err(ExpressionError::Conditional(s.to_string()));
        }
        if s.contains(['{', '}']) {
            return parse_template(s).map(Self::Template);
        }
        s.parse::<FieldPath>().map(Self::Path)
    }
}

fn strip_quotes(s: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            Some(&s[1..s.len() - 1])
        } else {
            None
        }
    })
}

/// `condition ? 'a' : 'b'`, as older mapping files wrote stock status.
fn is_conditional(s: &str) -> bool {
    let quoted_after = |pos: usize| s[pos + 1..].trim_start().starts_with(['\'', '"']);
    s.ends_with(['\'', '"']) && s.match_indices('?').any(|(pos, _)| quoted_after(pos)) && s.contains(':')
}

fn parse_template(s: &str) -> Result<Vec<TemplatePart>, ExpressionError> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut open: Option<usize> = None;
    for (pos, ch) in s.char_indices() {
        match (ch, open) {
            ('{', None) => {
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                }
                open = Some(pos);
            },
            ('{', Some(_)) => return Err(ExpressionError::NestedPlaceholder(pos)),
            ('}', None) => return Err(ExpressionError::UnexpectedClosingBrace(pos)),
            ('}', Some(start)) => {
                let inner = s[start + 1..pos].trim();
                if inner.is_empty() {
                    return Err(ExpressionError::EmptyPlaceholder(start));
                }
                parts.push(TemplatePart::Placeholder(inner.parse()?));
                open = None;
            },
            (_, None) => text.push(ch),
            (_, Some(_)) => {},
        }
    }
    if let Some(start) = open {
        return Err(ExpressionError::UnclosedPlaceholder(start));
    }
    if !text.is_empty() {
        parts.push(TemplatePart::Text(text));
    }
    Ok(parts)
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "'{s}'"),
            Self::Path(p) => write!(f, "{p}"),
            Self::Template(parts) => parts.iter().try_for_each(|part| match part {
                TemplatePart::Text(t) => f.write_str(t),
                TemplatePart::Placeholder(p) => write!(f, "{{{p}}}"),
            }),
        }
    }
}
