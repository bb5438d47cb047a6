//! The cart-to-order transaction pipeline.
//!
//! `CheckoutService` is the only writer of new orders. It re-validates the
//! cart against the live catalog (prices and availability may have moved
//! since the items were carted), then hands the store one atomic unit:
//! order + lines + total + payment + confirm. On any failure the caller's
//! cart is left intact so the customer can retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use bakeshop_cart::CartState;
use bakeshop_catalog::Catalog;
use bakeshop_core::{CustomerId, DomainError};
use bakeshop_orders::{NewOrder, NewOrderLine, OrderNumber};

use crate::activity::{ActivityLog, record_best_effort};
use crate::order_store::{OrderReceipt, OrderStore, StoreError};

/// How many order numbers to try before giving up on the checkout.
///
/// Collisions are rare (4 random digits per day) but real; each retry draws
/// a fresh number against the store's uniqueness constraint.
pub const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Checkout failure.
///
/// Domain failures (empty cart, vanished item) and infrastructure failures
/// (transaction abort) are both surfaced; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Caller-supplied checkout details. Address and phone may be empty
/// (counter pickup).
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: CustomerId,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub instructions: String,
    pub payment_method: String,
}

type NumberSource = Box<dyn Fn(DateTime<Utc>) -> OrderNumber + Send + Sync>;

/// Orchestrates Catalog + CartState + OrderStore into one committed order.
///
/// All collaborators are injected; the service holds no state of its own.
pub struct CheckoutService {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn OrderStore>,
    activity: Arc<dyn ActivityLog>,
    number_source: NumberSource,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn OrderStore>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self {
            catalog,
            store,
            activity,
            number_source: Box::new(OrderNumber::generate),
        }
    }

    /// Override order-number generation (tests exercise collision retries
    /// with a deterministic source).
    pub fn with_number_source(
        mut self,
        source: impl Fn(DateTime<Utc>) -> OrderNumber + Send + Sync + 'static,
    ) -> Self {
        self.number_source = Box::new(source);
        self
    }

    /// Convert `cart` into a committed order.
    ///
    /// On success the cart is cleared and a receipt returned; on any error
    /// the cart is untouched and no order, line, or payment rows exist.
    #[instrument(skip(self, cart, request), fields(customer_id = %request.customer_id), err)]
    pub async fn submit(
        &self,
        cart: &mut CartState,
        request: CheckoutRequest,
    ) -> Result<OrderReceipt, CheckoutError> {
        if cart.is_empty() {
            return Err(DomainError::validation("cart is empty").into());
        }

        let placed_at = Utc::now();

        // Re-validate every line against the live catalog. A vanished item
        // fails the whole checkout; prices are taken from the catalog at
        // this moment, not from the cart's add-time snapshot.
        let mut lines = Vec::with_capacity(cart.lines().len());
        for cart_line in cart.lines() {
            let item = self
                .catalog
                .item(cart_line.item_id)
                .ok_or(DomainError::NotFound)?;
            if !item.can_be_sold() {
                return Err(DomainError::validation(format!(
                    "'{}' is no longer available",
                    item.name
                ))
                .into());
            }
            lines.push(NewOrderLine {
                item_id: item.id,
                item_name: item.name,
                quantity: cart_line.quantity,
                unit_price: item.price,
                customization: cart_line.customization.clone(),
            });
        }

        let mut last_collision = String::new();
        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let number = (self.number_source)(placed_at);
            let order = NewOrder {
                customer_id: request.customer_id,
                number,
                delivery_address: request.delivery_address.clone(),
                delivery_phone: request.delivery_phone.clone(),
                instructions: request.instructions.clone(),
                payment_method: request.payment_method.clone(),
                placed_at,
                lines: lines.clone(),
            };

            match self.store.create_order(order).await {
                Ok(receipt) => {
                    record_best_effort(
                        &*self.activity,
                        &request.customer_id.to_string(),
                        "order_created",
                        &format!("Order {} created", receipt.number),
                    );
                    cart.clear();
                    return Ok(receipt);
                }
                Err(StoreError::Conflict(msg)) => {
                    tracing::debug!(attempt, %msg, "order number collision, regenerating");
                    last_collision = msg;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Storage(format!(
            "order number collisions exhausted after {ORDER_NUMBER_ATTEMPTS} attempts: {last_collision}"
        ))
        .into())
    }
}
