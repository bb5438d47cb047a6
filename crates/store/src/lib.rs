//! `bakeshop-store` — durable order storage and the checkout pipeline.
//!
//! This crate owns the one multi-entity atomic operation in the system:
//! committing a cart as an order with its line items, computed total, and
//! payment record, all-or-nothing. It also owns staff-driven status
//! transitions and the fire-and-forget activity log boundary.
//!
//! Everything here takes its collaborators as explicit handles (`Arc<dyn _>`);
//! there are no process-global singletons.

pub mod activity;
pub mod checkout;
pub mod lifecycle;
pub mod order_store;

pub use activity::{ActivityEntry, ActivityLog, ActivityLogError, InMemoryActivityLog, TracingActivityLog};
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, ORDER_NUMBER_ATTEMPTS};
pub use lifecycle::{LifecycleError, OrderLifecycle};
pub use order_store::{InMemoryOrderStore, OrderReceipt, OrderStore, PostgresOrderStore, StoreError, TodayStats};

#[cfg(test)]
mod integration_tests;
