use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bakeshop_core::{Money, OrderId, PaymentId};

/// Payment record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Payment record, 1:1 with its order.
///
/// Created alongside the order inside the checkout transaction; capture is
/// simulated (no gateway integration), so checkout writes it directly as
/// `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    /// Opaque payment-method token ("credit_card", "cash", ...).
    pub method: String,
    pub status: PaymentStatus,
    pub transaction_ref: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Simulated processor reference for a capture at `at`, e.g.
    /// `TXN20260824120501`.
    pub fn transaction_ref_for(at: DateTime<Utc>) -> String {
        format!("TXN{}", at.format("%Y%m%d%H%M%S"))
    }
}
