//! Durable entity store for orders, order lines, and payments.
//!
//! The store owns the uniqueness and total-consistency invariants:
//! `create_order` is a single atomic unit (order + lines + total + payment +
//! confirm) that either fully commits or leaves nothing behind, and order
//! numbers are unique across all orders, ever.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bakeshop_core::{CustomerId, Money, OrderId};
use bakeshop_orders::{NewOrder, Order, OrderNumber, OrderStatus};

/// Store operation error.
///
/// These are **infrastructure** failures (uniqueness, missing rows, broken
/// transactions) as opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced order does not exist.
    #[error("order not found")]
    NotFound,

    /// A uniqueness or optimistic-concurrency check failed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing storage failed; any in-flight transaction was rolled
    /// back in full.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// What the caller gets back from a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub number: OrderNumber,
    pub total: Money,
}

/// Same-day staff dashboard numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    pub orders_today: u64,
    pub revenue_today: Money,
    pub pending_orders: u64,
}

/// Durable order store.
///
/// ## Atomicity
///
/// `create_order` commits the order row (created `pending`), every line at
/// its frozen unit price, the computed total, the payment row (`completed`),
/// and the `confirmed` transition as **one** unit. Implementations must
/// guarantee that a failure at any point leaves no partial order behind.
///
/// ## Concurrency
///
/// Orders are independent aggregates; no cross-order locking is required.
/// Status updates use an optimistic check on the expected current status.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically commit a new order with its lines and payment.
    ///
    /// Rejects a duplicate order number with [`StoreError::Conflict`]
    /// without writing anything.
    async fn create_order(&self, order: NewOrder) -> Result<OrderReceipt, StoreError>;

    /// Fetch one order with lines and payment eagerly attached.
    async fn order(&self, id: OrderId) -> Result<Order, StoreError>;

    /// All orders for a customer, newest first. Empty is not an error.
    async fn orders_for_customer(&self, customer: CustomerId) -> Result<Vec<Order>, StoreError>;

    /// Move an order's status, checking that it still is `expected`.
    ///
    /// Returns [`StoreError::Conflict`] if the status moved underneath the
    /// caller. Also bumps `updated_at`.
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError>;

    /// Defensively recompute `total` from the current lines.
    ///
    /// Checkout already folds the total into its transaction; this exists
    /// for repair if lines are ever touched outside it.
    async fn recompute_total(&self, id: OrderId, now: DateTime<Utc>) -> Result<Money, StoreError>;

    /// Orders placed and revenue taken on the day containing `now`, plus
    /// the current count of `pending` orders.
    async fn today_stats(&self, now: DateTime<Utc>) -> Result<TodayStats, StoreError>;
}

#[async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn create_order(&self, order: NewOrder) -> Result<OrderReceipt, StoreError> {
        (**self).create_order(order).await
    }

    async fn order(&self, id: OrderId) -> Result<Order, StoreError> {
        (**self).order(id).await
    }

    async fn orders_for_customer(&self, customer: CustomerId) -> Result<Vec<Order>, StoreError> {
        (**self).orders_for_customer(customer).await
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        (**self).update_status(id, expected, next, now).await
    }

    async fn recompute_total(&self, id: OrderId, now: DateTime<Utc>) -> Result<Money, StoreError> {
        (**self).recompute_total(id, now).await
    }

    async fn today_stats(&self, now: DateTime<Utc>) -> Result<TodayStats, StoreError> {
        (**self).today_stats(now).await
    }
}
