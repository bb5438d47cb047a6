use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bakeshop_core::{CustomerId, Entity, ItemId, Money, OrderId, OrderLineId};

use crate::number::OrderNumber;
use crate::payment::Payment;
use crate::status::OrderStatus;

/// One catalog item quantity within a committed order.
///
/// `unit_price` is frozen at order-creation time and must not follow later
/// catalog price changes. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    /// Item name snapshot for receipts; survives catalog renames.
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub customization: String,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A durable, committed purchase.
///
/// Created once by the checkout transaction; afterwards only the status
/// (and `updated_at`) move, via validated lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub number: OrderNumber,
    /// Derived: always equals the sum of line totals.
    pub total: Money,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    /// Present once the order reached `confirmed` (always, for orders that
    /// went through checkout).
    pub payment: Option<Payment>,
}

impl Order {
    /// Recompute the total from the attached lines. Equals `self.total`
    /// unless something mutated lines outside the checkout transaction.
    pub fn computed_total(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

/// A fully validated order, ready for the store's atomic commit.
///
/// Built by the checkout pipeline after re-validating every cart line
/// against the live catalog; prices here are the catalog prices at this
/// moment, not the cart's add-time snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub number: OrderNumber,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub instructions: String,
    pub payment_method: String,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<NewOrderLine>,
}

/// One line of a not-yet-committed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub customization: String,
}

impl NewOrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

impl NewOrder {
    /// The total the committed order must carry.
    pub fn total(&self) -> Money {
        self.lines.iter().map(NewOrderLine::line_total).sum()
    }
}
