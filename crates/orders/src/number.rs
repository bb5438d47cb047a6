use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Human-readable order number: `ORD` + order date + a random 4-digit
/// suffix, e.g. `ORD202608241234`.
///
/// The format is display-stable; receipts and staff screens key off it.
/// Randomness alone does not guarantee uniqueness — the store enforces a
/// uniqueness constraint and checkout retries generation on a collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a number for an order placed at `at`.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix: u16 = rand::rng().random_range(1000..=9999);
        Self(format!("ORD{}{suffix}", at.format("%Y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}
