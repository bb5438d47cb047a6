use std::collections::HashMap;
use std::sync::RwLock;

use bakeshop_core::{ItemId, Money};

use crate::{Catalog, CatalogItem};

/// In-memory catalog.
///
/// Intended for tests/dev. Production deployments would back this trait with
/// whatever the merchandising system of record is.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemId, CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog pre-seeded with the sample bakery menu.
    pub fn with_sample_menu() -> Self {
        let catalog = Self::new();
        for (name, description, major, category, minutes) in [
            ("Chocolate cake", "Rich, moist chocolate layer cake", 45, "cakes", 20),
            ("Butter croissant", "Fresh croissant with quality butter", 12, "pastries", 5),
            ("Black coffee", "Strong Arabic-style coffee", 15, "drinks", 3),
            ("Cream eclair", "Eclair filled with vanilla cream", 18, "desserts", 10),
            ("Blueberry muffin", "Fresh muffin with wild blueberries", 22, "pastries", 15),
            ("Cappuccino", "Coffee with frothed milk", 18, "drinks", 4),
            ("Cheesecake", "Classic baked cheesecake", 38, "cakes", 25),
            ("Cheese bourekas", "Fresh bourekas with cheese filling", 16, "pastries", 8),
        ] {
            catalog.upsert(CatalogItem {
                id: ItemId::new(),
                name: name.to_string(),
                description: description.to_string(),
                price: Money::from_major(major),
                category: category.to_string(),
                available: true,
                preparation_minutes: minutes,
            });
        }
        catalog
    }

    /// Insert or replace an item.
    pub fn upsert(&self, item: CatalogItem) {
        self.items
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(item.id, item);
    }

    /// Remove an item entirely (it was never on the menu, as far as new
    /// orders are concerned).
    pub fn remove(&self, id: ItemId) -> Option<CatalogItem> {
        self.items.write().unwrap_or_else(|e| e.into_inner()).remove(&id)
    }

    /// Flip an item's availability flag. Returns false if the item is unknown.
    pub fn set_available(&self, id: ItemId, available: bool) -> bool {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        match items.get_mut(&id) {
            Some(item) => {
                item.available = available;
                true
            }
            None => false,
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn item(&self, id: ItemId) -> Option<CatalogItem> {
        self.items.read().unwrap_or_else(|e| e.into_inner()).get(&id).cloned()
    }

    fn list(&self, category: Option<&str>) -> Vec<CatalogItem> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        let mut listed: Vec<CatalogItem> = items
            .values()
            .filter(|i| i.available)
            .filter(|i| category.is_none_or(|c| i.category == c))
            .cloned()
            .collect();
        listed.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        listed
    }

    fn categories(&self) -> Vec<String> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        let mut categories: Vec<String> = items
            .values()
            .filter(|i| i.available)
            .map(|i| i.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_menu_lists_by_category_then_name() {
        let catalog = InMemoryCatalog::with_sample_menu();
        let all = catalog.list(None);
        assert_eq!(all.len(), 8);
        let keys: Vec<(&str, &str)> = all
            .iter()
            .map(|i| (i.category.as_str(), i.name.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn category_filter_and_categories() {
        let catalog = InMemoryCatalog::with_sample_menu();
        let drinks = catalog.list(Some("drinks"));
        assert_eq!(drinks.len(), 2);
        assert!(drinks.iter().all(|i| i.category == "drinks"));
        assert_eq!(catalog.categories(), vec!["cakes", "desserts", "drinks", "pastries"]);
    }

    #[test]
    fn unavailable_items_are_hidden_but_fetchable() {
        let catalog = InMemoryCatalog::with_sample_menu();
        let item = catalog.list(None).remove(0);
        assert!(catalog.set_available(item.id, false));
        assert!(!catalog.is_available(item.id));
        assert!(catalog.item(item.id).is_some());
        assert!(catalog.list(None).iter().all(|i| i.id != item.id));
    }

    #[test]
    fn removed_item_is_gone() {
        let catalog = InMemoryCatalog::with_sample_menu();
        let item = catalog.list(None).remove(0);
        assert!(catalog.remove(item.id).is_some());
        assert!(catalog.item(item.id).is_none());
        assert!(!catalog.is_available(item.id));
    }
}
