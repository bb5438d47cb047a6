use axum::{Router, routing::get};

pub mod cart;
pub mod checkout;
pub mod menu;
pub mod orders;
pub mod system;

/// Router for all endpoints except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/menu", menu::router())
        .nest("/cart", cart::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .route("/customers/:customer_id/orders", get(orders::list_customer_orders))
        .route("/stats/today", get(system::today_stats))
}
