//! Order Status

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an order.
///
/// Fulfilment runs `pending-payment → paid → processing → shipped →
/// completed`. Steps may be skipped (cash on delivery goes straight from
/// `pending-payment` to `processing`) but never reversed. `cancelled` is
/// reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Placed, waiting for payment
    #[default]
    PendingPayment,

    /// Payment received
    Paid,

    /// Being prepared for shipping
    Processing,

    /// Handed to the carrier
    Shipped,

    /// Delivered; terminal
    Completed,

    /// Abandoned; terminal
    Cancelled,
}

impl OrderStatus {
    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "pending-payment",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is allowed.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            (_, None) => next == Self::Cancelled,
            (None, Some(_)) => false,
        }
    }

    /// Position on the fulfilment path; `None` for `cancelled`.
    fn rank(self) -> Option<u8> {
        match self {
            Self::PendingPayment => Some(0),
            Self::Paid => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::Completed => Some(4),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn forward_steps_are_allowed() {
        assert!(OrderStatus::PendingPayment.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn skipping_forward_is_allowed() {
        assert!(OrderStatus::PendingPayment.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn backward_and_repeated_steps_are_rejected() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn cancel_is_reachable_from_every_open_status() {
        for status in ALL.into_iter().filter(|status| !status.is_terminal()) {
            assert!(
                status.can_transition_to(OrderStatus::Cancelled),
                "{status} should be cancellable"
            );
        }
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} should fail");
            }
        }
    }

    #[test]
    fn wire_names_are_kebab_case() -> testresult::TestResult {
        for status in ALL {
            assert_eq!(
                serde_json::to_string(&status)?,
                format!("\"{}\"", status.as_str())
            );
        }

        Ok(())
    }
}
