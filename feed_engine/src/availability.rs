//! Variant-level stock status.
//!
//! Ad platforms reject or demote items they believe are unavailable, so every variant is classified on its own: a
//! product can list some sizes as in stock and others as out of stock in the same feed.
use std::fmt::Display;

use serde::Serialize;
use shopify_tools::{InventoryPolicy, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    #[serde(rename = "in stock")]
    InStock,
    #[serde(rename = "out of stock")]
    OutOfStock,
    #[serde(rename = "preorder")]
    Preorder,
}

impl Availability {
    /// Classifies a variant. A `continue` policy means the merchant keeps selling past zero stock, so such variants
    /// are never out of stock, whatever their quantity.
    pub fn resolve(inventory_quantity: i64, inventory_policy: InventoryPolicy) -> Self {
        match inventory_policy {
            InventoryPolicy::Continue => Self::Preorder,
            InventoryPolicy::Deny if inventory_quantity > 0 => Self::InStock,
            InventoryPolicy::Deny => Self::OutOfStock,
        }
    }

    pub fn for_variant(variant: &Variant) -> Self {
        Self::resolve(variant.inventory_quantity, variant.inventory_policy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::OutOfStock => "out of stock",
            Self::Preorder => "preorder",
        }
    }
}

impl Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn continue_is_always_preorder() {
        for quantity in [i64::MIN, -3, -1, 0, 1, 5, i64::MAX] {
            assert_eq!(Availability::resolve(quantity, InventoryPolicy::Continue), Availability::Preorder);
        }
    }

    #[test]
    fn deny_follows_quantity() {
        assert_eq!(Availability::resolve(0, InventoryPolicy::Deny), Availability::OutOfStock);
        assert_eq!(Availability::resolve(1, InventoryPolicy::Deny), Availability::InStock);
        assert_eq!(Availability::resolve(-3, InventoryPolicy::Deny), Availability::OutOfStock);
        assert_eq!(Availability::resolve(250, InventoryPolicy::Deny), Availability::InStock);
    }

    #[test]
    fn variants_are_classified_independently() {
        let quantities = [3, 0, 7, -1, 1];
        let statuses = quantities
            .iter()
            .map(|&inventory_quantity| {
                let v = Variant { inventory_quantity, inventory_policy: InventoryPolicy::Deny, ..Default::default() };
                Availability::for_variant(&v).to_string()
            })
            .collect::<Vec<String>>();
        assert_eq!(statuses, ["in stock", "out of stock", "in stock", "out of stock", "in stock"]);
    }
}
