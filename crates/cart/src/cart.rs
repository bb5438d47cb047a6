use serde::{Deserialize, Serialize};

use bakeshop_catalog::CatalogItem;
use bakeshop_core::{DomainError, DomainResult, ItemId, Money};

/// Largest quantity a single line may carry, merges included.
///
/// Keeps every line extension comfortably inside the store schema's `INT`
/// quantity column and the `i64` money range.
pub const MAX_LINE_QUANTITY: u32 = 1_000;

/// One intended purchase within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    /// Name snapshot at add time, for display.
    pub name: String,
    /// Price snapshot at add time, for display. The order line's frozen
    /// price comes from the catalog at checkout, not from this field.
    pub unit_price: Money,
    pub quantity: u32,
    /// Free-text customization ("no sugar", "birthday greeting"). Opaque.
    pub customization: String,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// One customer's pre-checkout selections.
///
/// Mutation is single-writer by construction: the hosting layer serializes
/// requests per customer session, so no lock lives here.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    lines: Vec<CartLine>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total item count across lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add an item to the cart.
    ///
    /// A line with the same `(item, customization)` pair absorbs the new
    /// quantity; a different customization of the same item gets its own
    /// line. Zero quantity is rejected before it can reach the cart, and a
    /// line may never exceed [`MAX_LINE_QUANTITY`].
    pub fn add_item(
        &mut self,
        item: &CatalogItem,
        quantity: u32,
        customization: impl Into<String>,
    ) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(DomainError::validation(format!(
                "quantity is limited to {MAX_LINE_QUANTITY} per line"
            )));
        }

        let customization = customization.into();
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == item.id && l.customization == customization)
        {
            let merged = line.quantity.saturating_add(quantity);
            if merged > MAX_LINE_QUANTITY {
                return Err(DomainError::validation(format!(
                    "quantity is limited to {MAX_LINE_QUANTITY} per line"
                )));
            }
            line.quantity = merged;
            return Ok(());
        }

        self.lines.push(CartLine {
            item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            customization,
        });
        Ok(())
    }

    /// Remove a line by position. An out-of-range index is a no-op, matching
    /// the tolerant behavior a stale UI retry expects.
    pub fn remove_line(&mut self, index: usize) {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
    }

    /// Sum of `quantity * snapshot price` across lines. Pure.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Empty the cart. Called after a successful checkout commit.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
