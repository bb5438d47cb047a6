use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bakeshop_core::{CustomerId, Money, OrderId, OrderLineId, PaymentId};
use bakeshop_orders::{NewOrder, Order, OrderLine, OrderStatus, Payment, PaymentStatus};

use super::{OrderReceipt, OrderStore, StoreError, TodayStats};

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    // Uniqueness index: order numbers live here forever, even for
    // cancelled orders.
    numbers: HashSet<String>,
}

/// In-memory order store.
///
/// Intended for tests/dev. Atomicity comes for free: the committed `Order`
/// is fully materialized before the single map insertion under the write
/// guard, so a failure at any earlier point leaves no partial state.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    tables: RwLock<Tables>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderReceipt, StoreError> {
        let order_id = OrderId::new();
        let total = order.total();

        // Materialize the whole aggregate first; the map mutation below is
        // the commit point.
        let lines: Vec<OrderLine> = order
            .lines
            .iter()
            .map(|l| OrderLine {
                id: OrderLineId::new(),
                order_id,
                item_id: l.item_id,
                item_name: l.item_name.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                customization: l.customization.clone(),
            })
            .collect();

        let payment = Payment {
            id: PaymentId::new(),
            order_id,
            amount: total,
            method: order.payment_method.clone(),
            status: PaymentStatus::Completed,
            transaction_ref: Payment::transaction_ref_for(order.placed_at),
            created_at: order.placed_at,
        };

        let committed = Order {
            id: order_id,
            customer_id: order.customer_id,
            number: order.number.clone(),
            total,
            // Created pending, confirmed within the same commit once the
            // payment record exists.
            status: OrderStatus::Confirmed,
            delivery_address: order.delivery_address,
            delivery_phone: order.delivery_phone,
            instructions: order.instructions,
            created_at: order.placed_at,
            updated_at: order.placed_at,
            lines,
            payment: Some(payment),
        };

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if !tables.numbers.insert(order.number.as_str().to_string()) {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.number
            )));
        }
        tables.orders.insert(order_id, committed);

        Ok(OrderReceipt {
            order_id,
            number: order.number,
            total,
        })
    }

    async fn order(&self, id: OrderId) -> Result<Order, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.orders.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn orders_for_customer(&self, customer: CustomerId) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.customer_id == customer)
            .cloned()
            .collect();
        // Newest first; id (time-ordered) breaks created_at ties.
        orders.sort_by(|a, b| (b.created_at, b.id.as_uuid()).cmp(&(a.created_at, a.id.as_uuid())));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let order = tables.orders.get_mut(&id).ok_or(StoreError::NotFound)?;

        if order.status != expected {
            return Err(StoreError::Conflict(format!(
                "order {} is {}, expected {expected}",
                id, order.status
            )));
        }

        order.status = next;
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn recompute_total(&self, id: OrderId, now: DateTime<Utc>) -> Result<Money, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let order = tables.orders.get_mut(&id).ok_or(StoreError::NotFound)?;

        let total = order.computed_total();
        order.total = total;
        order.updated_at = now;
        Ok(total)
    }

    async fn today_stats(&self, now: DateTime<Utc>) -> Result<TodayStats, StoreError> {
        let today = now.date_naive();
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());

        let mut orders_today = 0u64;
        let mut revenue_today = Money::ZERO;
        let mut pending_orders = 0u64;
        for order in tables.orders.values() {
            if order.created_at.date_naive() == today {
                orders_today += 1;
                revenue_today += order.total;
            }
            if order.status == OrderStatus::Pending {
                pending_orders += 1;
            }
        }

        Ok(TodayStats {
            orders_today,
            revenue_today,
            pending_orders,
        })
    }
}
