//! Order status machine.
//!
//! Statuses are one-directional: an order starts `Pending` and ends in
//! exactly one of the terminal states. All legality checks go through
//! [`OrderStatus::transition`] rather than being inferred from timer values
//! at call sites.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid order status transition: {from} -> {to}")]
pub struct TransitionError {
    /// Status the order was in.
    pub from: OrderStatus,
    /// Status the transition asked for.
    pub to: OrderStatus,
}

/// Lifecycle status of an order.
///
/// Wire values match the remote API (`"Pending"`, `"Successful"`,
/// `"Cancelled"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, still inside the cancellation grace window.
    #[default]
    Pending,
    /// Confirmed, either by window expiry or by the remote side rejecting a
    /// late cancellation.
    Successful,
    /// Cancelled by the user inside the grace window.
    Cancelled,
}

impl OrderStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Successful | Self::Cancelled)
    }

    /// Attempt the transition `self -> to`.
    ///
    /// Only `Pending -> Successful` and `Pending -> Cancelled` are legal;
    /// terminal states admit nothing, and nothing transitions back to
    /// `Pending`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] for any other pair.
    pub const fn transition(self, to: Self) -> Result<Self, TransitionError> {
        match (self, to) {
            (Self::Pending, Self::Successful | Self::Cancelled) => Ok(to),
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Successful => write!(f, "Successful"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Successful" => Ok(Self::Successful),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_reaches_both_terminal_states() {
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Successful),
            Ok(OrderStatus::Successful)
        );
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Cancelled),
            Ok(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [OrderStatus::Successful, OrderStatus::Cancelled] {
            for to in [
                OrderStatus::Pending,
                OrderStatus::Successful,
                OrderStatus::Cancelled,
            ] {
                assert_eq!(from.transition(to), Err(TransitionError { from, to }));
            }
        }
    }

    #[test]
    fn nothing_returns_to_pending() {
        assert!(
            OrderStatus::Pending
                .transition(OrderStatus::Pending)
                .is_err()
        );
    }

    #[test]
    fn wire_values_round_trip() {
        let json = serde_json::to_string(&OrderStatus::Successful).expect("serialize");
        assert_eq!(json, "\"Successful\"");
        let parsed: OrderStatus = serde_json::from_str("\"Cancelled\"").expect("deserialize");
        assert_eq!(parsed, OrderStatus::Cancelled);
    }
}
