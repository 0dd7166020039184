//! Turns Shopify products into feed items.
//!
//! Every variant of every product becomes one [`crate::FeedItem`] per channel. The records an item is built from are
//! plain JSON values, so mappings can reach any attribute the API sends, not just the typed ones.
pub mod assembler;
pub mod expression;
pub mod records;
pub mod resolver;

pub use assembler::{map_variant, AssembledFeed, FeedAssembler, MappedItem};
pub use expression::{Expression, ExpressionError, FieldPath, PathRoot, Segment, TemplatePart};
pub use resolver::{value_to_text, ResolveContext, Resolved};
