use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bakeshop_core::{DomainError, DomainResult};

/// Order status lifecycle.
///
/// `pending → confirmed → preparing → ready → delivered`, with `cancelled`
/// reachable from any non-terminal state. The vocabulary is closed: staff
/// input is parsed against it and anything else is rejected, rather than
/// stored as a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `self → next` is a legal step in the lifecycle graph.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, Ready)
            | (Ready, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Validate a staff-driven transition.
    pub fn validate_transition(self, next: OrderStatus) -> DomainResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "illegal status transition: {self} -> {next}"
            )))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        for (from, to) in [
            (Pending, Confirmed),
            (Confirmed, Preparing),
            (Preparing, Ready),
            (Ready, Delivered),
        ] {
            assert!(from.can_transition_to(to), "{from} -> {to}");
        }
    }

    #[test]
    fn cancel_is_legal_from_any_non_terminal_state() {
        for from in [Pending, Confirmed, Preparing, Ready] {
            assert!(from.can_transition_to(Cancelled), "{from} -> cancelled");
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for from in [Delivered, Cancelled] {
            for to in [Pending, Confirmed, Preparing, Ready, Delivered, Cancelled] {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let err = Pending.validate_transition(Ready).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in [Pending, Confirmed, Preparing, Ready] {
            assert!(!status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn parses_the_staff_vocabulary_and_nothing_else() {
        assert_eq!("preparing".parse::<OrderStatus>().unwrap(), Preparing);
        assert!(matches!(
            "shipped".parse::<OrderStatus>(),
            Err(DomainError::Validation(_))
        ));
    }
}
