use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use bakeshop_catalog::Catalog;
use bakeshop_core::{CustomerId, ItemId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:customer_id", get(get_cart).delete(clear_cart))
        .route("/:customer_id/items", post(add_item))
        .route("/:customer_id/items/:index", delete(remove_item))
}

fn parse_customer(id: &str) -> Result<CustomerId, axum::response::Response> {
    id.parse().map_err(errors::domain_error_to_response)
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let cart = services.cart(customer);
    let cart = cart.lock().await;
    (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response()
}

/// Add an item to the customer's cart.
///
/// The item must exist and be available; the same item with the same
/// special requests merges into the existing line.
pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    let customer = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let item_id: ItemId = match body.item_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let Some(item) = services.catalog.item(item_id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "menu item not found");
    };
    if !item.can_be_sold() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("'{}' is not available", item.name),
        );
    }

    let cart = services.cart(customer);
    let mut cart = cart.lock().await;
    if let Err(e) = cart.add_item(&item, body.quantity, body.special_requests) {
        return errors::domain_error_to_response(e);
    }
    (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response()
}

/// Remove one cart line by position. Out-of-range is a no-op.
pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((customer_id, index)): Path<(String, usize)>,
) -> axum::response::Response {
    let customer = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let cart = services.cart(customer);
    let mut cart = cart.lock().await;
    cart.remove_line(index);
    (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response()
}

pub async fn clear_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let cart = services.cart(customer);
    let mut cart = cart.lock().await;
    cart.clear();
    (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response()
}
