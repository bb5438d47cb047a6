use serde::{Deserialize, Serialize};

use bakeshop_core::{Entity, ItemId, Money};

/// A purchasable catalog item.
///
/// Immutable from the checkout pipeline's perspective: within one checkout
/// the item is fetched once and its price at that moment is frozen into the
/// order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// Current unit price in minor currency units.
    pub price: Money,
    pub category: String,
    pub available: bool,
    /// Kitchen estimate, for display only.
    pub preparation_minutes: u32,
}

impl CatalogItem {
    /// Check if the item can be sold right now.
    pub fn can_be_sold(&self) -> bool {
        self.available
    }
}

impl Entity for CatalogItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}
