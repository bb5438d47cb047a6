//! Catalog domain module.
//!
//! Read-only lookup of purchasable items. From the checkout pipeline's
//! perspective the catalog is a leaf collaborator: it supplies the current
//! name, price, and availability of an item and nothing else.

pub mod in_memory;
pub mod item;

pub use in_memory::InMemoryCatalog;
pub use item::CatalogItem;

use std::sync::Arc;

use bakeshop_core::ItemId;

/// Read-only catalog lookup.
///
/// Prices and availability reflect the catalog *now*; callers that captured
/// a snapshot earlier (the cart) must re-fetch before committing an order.
pub trait Catalog: Send + Sync {
    /// Look up one item by id.
    fn item(&self, id: ItemId) -> Option<CatalogItem>;

    /// Whether the item exists and is currently purchasable.
    fn is_available(&self, id: ItemId) -> bool {
        self.item(id).is_some_and(|i| i.can_be_sold())
    }

    /// Available items, optionally restricted to one category, ordered by
    /// category then name.
    fn list(&self, category: Option<&str>) -> Vec<CatalogItem>;

    /// Distinct categories with at least one available item.
    fn categories(&self) -> Vec<String>;
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn item(&self, id: ItemId) -> Option<CatalogItem> {
        (**self).item(id)
    }

    fn is_available(&self, id: ItemId) -> bool {
        (**self).is_available(id)
    }

    fn list(&self, category: Option<&str>) -> Vec<CatalogItem> {
        (**self).list(category)
    }

    fn categories(&self) -> Vec<String> {
        (**self).categories()
    }
}
