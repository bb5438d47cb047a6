//! End-to-end tests for the checkout pipeline and order lifecycle against
//! the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, Utc};

use bakeshop_cart::CartState;
use bakeshop_catalog::{Catalog, CatalogItem, InMemoryCatalog};
use bakeshop_core::{CustomerId, DomainError, ItemId, Money};
use bakeshop_orders::{NewOrder, NewOrderLine, OrderNumber, OrderStatus, PaymentStatus};

use crate::activity::{ActivityLog, ActivityLogError, InMemoryActivityLog};
use crate::checkout::{CheckoutError, CheckoutRequest, CheckoutService, ORDER_NUMBER_ATTEMPTS};
use crate::lifecycle::{LifecycleError, OrderLifecycle};
use crate::order_store::{InMemoryOrderStore, OrderStore, StoreError};

struct Fixture {
    catalog: Arc<InMemoryCatalog>,
    store: Arc<InMemoryOrderStore>,
    activity: Arc<InMemoryActivityLog>,
    checkout: CheckoutService,
    lifecycle: OrderLifecycle,
}

fn fixture() -> Fixture {
    let catalog = Arc::new(InMemoryCatalog::with_sample_menu());
    let store = Arc::new(InMemoryOrderStore::new());
    let activity = Arc::new(InMemoryActivityLog::new());
    let checkout = CheckoutService::new(catalog.clone(), store.clone(), activity.clone());
    let lifecycle = OrderLifecycle::new(store.clone(), activity.clone());
    Fixture {
        catalog,
        store,
        activity,
        checkout,
        lifecycle,
    }
}

fn menu_item(catalog: &InMemoryCatalog, name: &str) -> CatalogItem {
    catalog
        .list(None)
        .into_iter()
        .find(|i| i.name == name)
        .expect("sample menu item")
}

fn request(customer: CustomerId) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: customer,
        delivery_address: "1 Herzl St, Tel Aviv".to_string(),
        delivery_phone: "050-1234567".to_string(),
        instructions: String::new(),
        payment_method: "credit_card".to_string(),
    }
}

fn cake_and_two_coffees(catalog: &InMemoryCatalog) -> CartState {
    let cake = menu_item(catalog, "Chocolate cake");
    let coffee = menu_item(catalog, "Black coffee");
    let mut cart = CartState::new();
    cart.add_item(&cake, 1, "").unwrap();
    cart.add_item(&coffee, 2, "").unwrap();
    cart
}

#[tokio::test]
async fn checkout_commits_order_lines_payment_and_confirms() {
    let fx = fixture();
    let customer = CustomerId::new();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    assert_eq!(cart.total(), Money::from_major(75));

    let receipt = fx.checkout.submit(&mut cart, request(customer)).await.unwrap();
    assert_eq!(receipt.total, Money::from_major(75));
    assert!(cart.is_empty());

    let order = fx.store.order(receipt.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.total, Money::from_major(75));
    assert_eq!(order.total, order.computed_total());
    assert_eq!(order.lines.len(), 2);
    assert_eq!(order.number, receipt.number);

    let payment = order.payment.expect("payment committed with the order");
    assert_eq!(payment.amount, Money::from_major(75));
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.transaction_ref.starts_with("TXN"));

    let recorded = fx.activity.entries();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].action, "order_created");
}

#[tokio::test]
async fn empty_cart_is_rejected_and_nothing_is_written() {
    let fx = fixture();
    let customer = CustomerId::new();
    let mut cart = CartState::new();

    let err = fx.checkout.submit(&mut cart, request(customer)).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(DomainError::Validation(_))
    ));

    assert!(fx.store.orders_for_customer(customer).await.unwrap().is_empty());
    assert!(fx.activity.entries().is_empty());
}

#[tokio::test]
async fn item_deleted_between_carting_and_checkout_fails_whole_operation() {
    let fx = fixture();
    let customer = CustomerId::new();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let cake = menu_item(&fx.catalog, "Chocolate cake");

    fx.catalog.remove(cake.id);

    let before = cart.clone();
    let err = fx.checkout.submit(&mut cart, request(customer)).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Domain(DomainError::NotFound)));

    // No partial order, and the cart is intact for a retry.
    assert_eq!(cart, before);
    assert!(fx.store.orders_for_customer(customer).await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_item_fails_checkout_with_validation() {
    let fx = fixture();
    let customer = CustomerId::new();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let cake = menu_item(&fx.catalog, "Chocolate cake");

    fx.catalog.set_available(cake.id, false);

    let err = fx.checkout.submit(&mut cart, request(customer)).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(DomainError::Validation(_))
    ));
    assert!(!cart.is_empty());
}

#[tokio::test]
async fn checkout_uses_current_catalog_price_not_cart_snapshot() {
    let fx = fixture();
    let customer = CustomerId::new();
    let mut cake = menu_item(&fx.catalog, "Chocolate cake");
    let mut cart = CartState::new();
    cart.add_item(&cake, 1, "").unwrap();

    // Price moves between carting and checkout.
    cake.price = Money::from_major(50);
    fx.catalog.upsert(cake);

    let receipt = fx.checkout.submit(&mut cart, request(customer)).await.unwrap();
    assert_eq!(receipt.total, Money::from_major(50));

    let order = fx.store.order(receipt.order_id).await.unwrap();
    assert_eq!(order.lines[0].unit_price, Money::from_major(50));
}

#[tokio::test]
async fn order_number_collision_is_retried_transparently() {
    let fx = fixture();
    let taken = OrderNumber::from("ORD202608241111".to_string());
    let fresh = OrderNumber::from("ORD202608242222".to_string());

    // Seed the store with the taken number.
    let first = CheckoutService::new(fx.catalog.clone(), fx.store.clone(), fx.activity.clone())
        .with_number_source({
            let taken = taken.clone();
            move |_| taken.clone()
        });
    let mut cart = cake_and_two_coffees(&fx.catalog);
    first.submit(&mut cart, request(CustomerId::new())).await.unwrap();

    // Second checkout draws the taken number twice, then a fresh one.
    let draws = AtomicUsize::new(0);
    let second = CheckoutService::new(fx.catalog.clone(), fx.store.clone(), fx.activity.clone())
        .with_number_source({
            let taken = taken.clone();
            let fresh = fresh.clone();
            move |_| {
                if draws.fetch_add(1, Ordering::SeqCst) < 2 {
                    taken.clone()
                } else {
                    fresh.clone()
                }
            }
        });

    let mut cart = cake_and_two_coffees(&fx.catalog);
    let receipt = second.submit(&mut cart, request(CustomerId::new())).await.unwrap();
    assert_eq!(receipt.number, fresh);
}

#[tokio::test]
async fn exhausted_collision_retries_surface_as_storage_and_keep_the_cart() {
    let fx = fixture();
    let taken = OrderNumber::from("ORD202608243333".to_string());

    let seeder = CheckoutService::new(fx.catalog.clone(), fx.store.clone(), fx.activity.clone())
        .with_number_source({
            let taken = taken.clone();
            move |_| taken.clone()
        });
    let mut cart = cake_and_two_coffees(&fx.catalog);
    seeder.submit(&mut cart, request(CustomerId::new())).await.unwrap();

    let draws = Arc::new(AtomicUsize::new(0));
    let stuck = CheckoutService::new(fx.catalog.clone(), fx.store.clone(), fx.activity.clone())
        .with_number_source({
            let taken = taken.clone();
            let draws = draws.clone();
            move |_| {
                draws.fetch_add(1, Ordering::SeqCst);
                taken.clone()
            }
        });

    let customer = CustomerId::new();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let err = stuck.submit(&mut cart, request(customer)).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Store(StoreError::Storage(_))));
    assert_eq!(draws.load(Ordering::SeqCst), ORDER_NUMBER_ATTEMPTS);
    assert!(!cart.is_empty());
    assert!(fx.store.orders_for_customer(customer).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_checkouts_never_collide_or_cross_contaminate() {
    let fx = fixture();
    let checkout = Arc::new(CheckoutService::new(
        fx.catalog.clone(),
        fx.store.clone(),
        fx.activity.clone(),
    ));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let checkout = checkout.clone();
        let catalog = fx.catalog.clone();
        handles.push(tokio::spawn(async move {
            let customer = CustomerId::new();
            let mut cart = cake_and_two_coffees(&catalog);
            let receipt = checkout.submit(&mut cart, request(customer)).await.unwrap();
            (customer, receipt)
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let (customer, receipt) = handle.await.unwrap();
        assert!(numbers.insert(receipt.number.as_str().to_string()));

        let orders = fx.store.orders_for_customer(customer).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].lines.len(), 2);
        assert_eq!(orders[0].total, Money::from_major(75));
    }
    assert_eq!(numbers.len(), 16);
}

#[tokio::test]
async fn lifecycle_walks_the_graph_and_terminal_states_reject() {
    let fx = fixture();
    let customer = CustomerId::new();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let receipt = fx.checkout.submit(&mut cart, request(customer)).await.unwrap();

    for next in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ] {
        let order = fx.lifecycle.set_status(receipt.order_id, next, "staff").await.unwrap();
        assert_eq!(order.status, next);
    }

    let err = fx
        .lifecycle
        .set_status(receipt.order_id, OrderStatus::Cancelled, "staff")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Domain(DomainError::InvariantViolation(_))
    ));
}

#[tokio::test]
async fn cancelled_orders_accept_nothing_further() {
    let fx = fixture();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let receipt = fx.checkout.submit(&mut cart, request(CustomerId::new())).await.unwrap();

    fx.lifecycle
        .set_status(receipt.order_id, OrderStatus::Cancelled, "staff")
        .await
        .unwrap();

    let err = fx
        .lifecycle
        .set_status(receipt.order_id, OrderStatus::Preparing, "staff")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Domain(DomainError::InvariantViolation(_))
    ));
}

#[tokio::test]
async fn stale_status_update_is_a_conflict() {
    let fx = fixture();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let receipt = fx.checkout.submit(&mut cart, request(CustomerId::new())).await.unwrap();

    // Another staff terminal moved the order first.
    fx.store
        .update_status(
            receipt.order_id,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            Utc::now(),
        )
        .await
        .unwrap();

    let err = fx
        .store
        .update_status(
            receipt.order_id,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn status_updates_touch_updated_at_and_are_audited() {
    let fx = fixture();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let receipt = fx.checkout.submit(&mut cart, request(CustomerId::new())).await.unwrap();
    let before = fx.store.order(receipt.order_id).await.unwrap();

    let after = fx
        .lifecycle
        .set_status(receipt.order_id, OrderStatus::Preparing, "staff")
        .await
        .unwrap();
    assert!(after.updated_at >= before.updated_at);

    let actions: Vec<String> = fx.activity.entries().iter().map(|e| e.action.clone()).collect();
    assert_eq!(actions, vec!["order_created", "order_status_update"]);
}

struct UnavailableActivityLog;

impl ActivityLog for UnavailableActivityLog {
    fn record(&self, _: &str, _: &str, _: &str) -> Result<(), ActivityLogError> {
        Err(ActivityLogError("audit sink offline".to_string()))
    }
}

#[tokio::test]
async fn failing_audit_sink_never_blocks_checkout_or_lifecycle() {
    let catalog = Arc::new(InMemoryCatalog::with_sample_menu());
    let store = Arc::new(InMemoryOrderStore::new());
    let activity = Arc::new(UnavailableActivityLog);
    let checkout = CheckoutService::new(catalog.clone(), store.clone(), activity.clone());
    let lifecycle = OrderLifecycle::new(store.clone(), activity);

    let mut cart = cake_and_two_coffees(&catalog);
    let receipt = checkout.submit(&mut cart, request(CustomerId::new())).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(receipt.total, Money::from_major(75));

    let order = lifecycle
        .set_status(receipt.order_id, OrderStatus::Preparing, "staff")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Preparing);
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let fx = fixture();
    let err = fx.store.order(bakeshop_core::OrderId::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let err = fx
        .lifecycle
        .set_status(bakeshop_core::OrderId::new(), OrderStatus::Preparing, "staff")
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Store(StoreError::NotFound)));
}

#[tokio::test]
async fn recompute_total_matches_the_lines() {
    let fx = fixture();
    let mut cart = cake_and_two_coffees(&fx.catalog);
    let receipt = fx.checkout.submit(&mut cart, request(CustomerId::new())).await.unwrap();

    let total = fx.store.recompute_total(receipt.order_id, Utc::now()).await.unwrap();
    assert_eq!(total, Money::from_major(75));
    assert_eq!(fx.store.order(receipt.order_id).await.unwrap().total, total);
}

fn direct_order(customer: CustomerId, number: &str, placed_at: chrono::DateTime<Utc>) -> NewOrder {
    NewOrder {
        customer_id: customer,
        number: OrderNumber::from(number.to_string()),
        delivery_address: String::new(),
        delivery_phone: String::new(),
        instructions: String::new(),
        payment_method: "cash".to_string(),
        placed_at,
        lines: vec![NewOrderLine {
            item_id: ItemId::new(),
            item_name: "Cheesecake".to_string(),
            quantity: 1,
            unit_price: Money::from_major(38),
            customization: String::new(),
        }],
    }
}

#[tokio::test]
async fn orders_list_newest_first() {
    let fx = fixture();
    let customer = CustomerId::new();
    let now = Utc::now();

    fx.store
        .create_order(direct_order(customer, "ORD202608230001", now - Duration::hours(2)))
        .await
        .unwrap();
    fx.store
        .create_order(direct_order(customer, "ORD202608240002", now))
        .await
        .unwrap();

    let orders = fx.store.orders_for_customer(customer).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].number.as_str(), "ORD202608240002");
    assert_eq!(orders[1].number.as_str(), "ORD202608230001");
}

#[tokio::test]
async fn today_stats_count_only_today() {
    let fx = fixture();
    let customer = CustomerId::new();
    let now = Utc::now();

    fx.store
        .create_order(direct_order(customer, "ORD202608230003", now - Duration::days(1)))
        .await
        .unwrap();
    fx.store
        .create_order(direct_order(customer, "ORD202608240004", now))
        .await
        .unwrap();

    let stats = fx.store.today_stats(now).await.unwrap();
    assert_eq!(stats.orders_today, 1);
    assert_eq!(stats.revenue_today, Money::from_major(38));
    assert_eq!(stats.pending_orders, 0);
}
