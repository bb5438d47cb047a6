//! Orders domain module.
//!
//! Durable, committed purchases: the `Order` aggregate with its line items
//! and payment record, the closed status lifecycle, and the human-readable
//! order number. Business rules only; persistence lives in `bakeshop-store`.

pub mod number;
pub mod order;
pub mod payment;
pub mod status;

pub use number::OrderNumber;
pub use order::{NewOrder, NewOrderLine, Order, OrderLine};
pub use payment::{Payment, PaymentStatus};
pub use status::OrderStatus;
