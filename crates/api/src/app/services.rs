//! Service wiring behind the HTTP handlers.
//!
//! Everything runs against the in-memory implementations; swapping in
//! `PostgresOrderStore` is a wiring change here, not a handler change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bakeshop_cart::CartState;
use bakeshop_catalog::InMemoryCatalog;
use bakeshop_core::CustomerId;
use bakeshop_store::{
    CheckoutService, InMemoryOrderStore, OrderLifecycle, OrderStore, TracingActivityLog,
};

/// One customer's cart session.
///
/// The inner lock is a tokio mutex because checkout holds the cart across
/// await points; the outer registry lock is only held to clone the handle.
pub type CartHandle = Arc<tokio::sync::Mutex<CartState>>;

pub struct AppServices {
    pub catalog: Arc<InMemoryCatalog>,
    pub store: Arc<dyn OrderStore>,
    pub checkout: CheckoutService,
    pub lifecycle: OrderLifecycle,
    carts: Mutex<HashMap<CustomerId, CartHandle>>,
}

impl AppServices {
    /// The cart session for `customer`, created empty on first touch.
    pub fn cart(&self, customer: CustomerId) -> CartHandle {
        self.carts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(customer)
            .or_default()
            .clone()
    }
}

pub fn build_services() -> AppServices {
    let catalog = Arc::new(InMemoryCatalog::with_sample_menu());
    let store: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    let activity = Arc::new(TracingActivityLog);

    let checkout = CheckoutService::new(catalog.clone(), store.clone(), activity.clone());
    let lifecycle = OrderLifecycle::new(store.clone(), activity);

    AppServices {
        catalog,
        store,
        checkout,
        lifecycle,
        carts: Mutex::new(HashMap::new()),
    }
}
