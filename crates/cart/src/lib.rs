//! Cart domain module.
//!
//! A cart is one customer's pre-checkout selections: an explicit value owned
//! by the caller (request-scoped), never ambient session state and never
//! durable. It holds display snapshots of name and price captured at add
//! time; the checkout pipeline re-prices every line against the live catalog
//! before committing.

pub mod cart;

pub use cart::{CartLine, CartState, MAX_LINE_QUANTITY};
