use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bakeshop_core::{CustomerId, OrderId};
use bakeshop_orders::OrderStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_order))
        .route("/:id/status", post(set_status))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.store.order(id).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// All orders for one customer, newest first.
pub async fn list_customer_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer: CustomerId = match customer_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.store.orders_for_customer(customer).await {
        Ok(orders) => {
            let orders = orders.iter().map(dto::order_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Staff endpoint: move an order along its lifecycle.
///
/// An unknown status word is a 400; a legal-vocabulary but illegal
/// transition is a 422; losing a race with another transition is a 409.
pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let next: OrderStatus = match body.status.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.lifecycle.set_status(id, next, "staff").await {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
