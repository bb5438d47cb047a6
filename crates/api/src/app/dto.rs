use serde::Deserialize;
use serde_json::json;

use bakeshop_cart::CartState;
use bakeshop_catalog::CatalogItem;
use bakeshop_core::Money;
use bakeshop_orders::Order;
use bakeshop_store::{OrderReceipt, TodayStats};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub item_id: String,
    pub quantity: u32,
    /// Free-text customization; absent means none.
    #[serde(default)]
    pub special_requests: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequestBody {
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_phone: String,
    #[serde(default)]
    pub special_instructions: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "credit_card".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

// -------------------------
// Response mapping
// -------------------------

/// Money renders as a decimal string alongside the exact minor-unit amount.
fn money_to_json(m: Money) -> serde_json::Value {
    json!({ "amount": m.minor(), "display": m.to_string() })
}

pub fn item_to_json(item: &CatalogItem) -> serde_json::Value {
    json!({
        "id": item.id.to_string(),
        "name": item.name,
        "description": item.description,
        "price": money_to_json(item.price),
        "category": item.category,
        "available": item.available,
        "preparation_minutes": item.preparation_minutes,
    })
}

pub fn cart_to_json(cart: &CartState) -> serde_json::Value {
    let items: Vec<serde_json::Value> = cart
        .lines()
        .iter()
        .map(|line| {
            json!({
                "item_id": line.item_id.to_string(),
                "name": line.name,
                "unit_price": money_to_json(line.unit_price),
                "quantity": line.quantity,
                "special_requests": line.customization,
                "line_total": money_to_json(line.line_total()),
            })
        })
        .collect();

    json!({
        "items": items,
        "item_count": cart.item_count(),
        "total": money_to_json(cart.total()),
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    let items: Vec<serde_json::Value> = order
        .lines
        .iter()
        .map(|line| {
            json!({
                "item_id": line.item_id.to_string(),
                "name": line.item_name,
                "unit_price": money_to_json(line.unit_price),
                "quantity": line.quantity,
                "special_requests": line.customization,
                "line_total": money_to_json(line.line_total()),
            })
        })
        .collect();

    let payment = order.payment.as_ref().map(|p| {
        json!({
            "amount": money_to_json(p.amount),
            "method": p.method,
            "status": p.status,
            "transaction_ref": p.transaction_ref,
        })
    });

    json!({
        "id": order.id.to_string(),
        "order_number": order.number.as_str(),
        "customer_id": order.customer_id.to_string(),
        "status": order.status,
        "total": money_to_json(order.total),
        "delivery_address": order.delivery_address,
        "delivery_phone": order.delivery_phone,
        "special_instructions": order.instructions,
        "created_at": order.created_at,
        "updated_at": order.updated_at,
        "items": items,
        "payment": payment,
    })
}

pub fn receipt_to_json(receipt: &OrderReceipt) -> serde_json::Value {
    json!({
        "order_id": receipt.order_id.to_string(),
        "order_number": receipt.number.as_str(),
        "total": money_to_json(receipt.total),
    })
}

pub fn stats_to_json(stats: &TodayStats) -> serde_json::Value {
    json!({
        "orders_today": stats.orders_today,
        "revenue_today": money_to_json(stats.revenue_today),
        "pending_orders": stats.pending_orders,
    })
}
