use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use bakeshop_core::CustomerId;
use bakeshop_store::CheckoutRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:customer_id", post(submit_checkout))
}

/// Convert the customer's cart into a committed order.
///
/// The cart lock is held across the whole submit, so a concurrent add or
/// second checkout on the same session waits rather than racing.
pub async fn submit_checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
    Json(body): Json<dto::CheckoutRequestBody>,
) -> axum::response::Response {
    let customer: CustomerId = match customer_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let request = CheckoutRequest {
        customer_id: customer,
        delivery_address: body.delivery_address,
        delivery_phone: body.delivery_phone,
        instructions: body.special_instructions,
        payment_method: body.payment_method,
    };

    let cart = services.cart(customer);
    let mut cart = cart.lock().await;
    match services.checkout.submit(&mut cart, request).await {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
