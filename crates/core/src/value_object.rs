//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable domain values with no identity of their own:
/// two instances with the same attribute values are interchangeable. `Money`
/// is the canonical example — 45.00 is 45.00, wherever it came from.
///
/// To "modify" a value object, construct a new one with the new values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
