//! Staff-driven order status transitions.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use bakeshop_core::{DomainError, OrderId};
use bakeshop_orders::{Order, OrderStatus};

use crate::activity::{ActivityLog, record_best_effort};
use crate::order_store::{OrderStore, StoreError};

/// Status transition failure.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates and applies status transitions on persisted orders.
pub struct OrderLifecycle {
    store: Arc<dyn OrderStore>,
    activity: Arc<dyn ActivityLog>,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn OrderStore>, activity: Arc<dyn ActivityLog>) -> Self {
        Self { store, activity }
    }

    /// Move an order to `next`, enforcing the lifecycle graph.
    ///
    /// The update carries an optimistic check on the status we validated
    /// against, so a concurrent transition surfaces as a conflict instead
    /// of silently overwriting it. `actor` identifies the staff member for
    /// the audit trail.
    #[instrument(skip(self), fields(order_id = %order_id, %next), err)]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        actor: &str,
    ) -> Result<Order, LifecycleError> {
        let order = self.store.order(order_id).await?;
        order.status.validate_transition(next)?;

        let updated = self
            .store
            .update_status(order_id, order.status, next, Utc::now())
            .await?;

        record_best_effort(
            &*self.activity,
            actor,
            "order_status_update",
            &format!("Order {} status changed to {next}", updated.number),
        );

        Ok(updated)
    }
}
