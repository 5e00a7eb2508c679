//! Order lifecycle reducer.
//!
//! The tracker feeds events into [`reduce`] in arrival order and performs
//! whatever effect comes back. Keeping the precedence rules in one pure
//! function (instead of guards scattered across call sites) makes the
//! cancel-vs-expiry race explicit: `RemoteConfirmed` carries server truth
//! and the last applied event wins.

use crate::types::status::OrderStatus;

/// Events observed for a single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The client-side countdown for this order reached 0 this tick.
    TickExpired,
    /// The user asked to cancel; `remaining` is the window at that instant.
    CancelRequested {
        remaining: u64,
    },
    /// The remote side confirmed a status (either endpoint's response).
    RemoteConfirmed(OrderStatus),
}

/// Network effect the tracker must perform after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    None,
    /// Issue the Pending -> Successful confirmation call.
    RequestConfirmation,
    /// Issue the cancellation call.
    RequestCancellation,
}

/// Apply one event to an order's status, returning the new status and the
/// effect to perform.
///
/// - `TickExpired` on a Pending order requests confirmation; the status
///   only changes once the remote side answers.
/// - `CancelRequested` is a no-op unless the order is Pending with window
///   time left; the guard lives here, not at the call site.
/// - `RemoteConfirmed` always applies. Responses for the in-flight
///   confirm/cancel race arrive in some order and the last one observed is
///   what the display shows.
#[must_use]
pub fn reduce(current: OrderStatus, event: LifecycleEvent) -> (OrderStatus, LifecycleEffect) {
    match event {
        LifecycleEvent::TickExpired => {
            if current == OrderStatus::Pending {
                (current, LifecycleEffect::RequestConfirmation)
            } else {
                (current, LifecycleEffect::None)
            }
        }
        LifecycleEvent::CancelRequested { remaining } => {
            if current == OrderStatus::Pending && remaining > 0 {
                (current, LifecycleEffect::RequestCancellation)
            } else {
                (current, LifecycleEffect::None)
            }
        }
        LifecycleEvent::RemoteConfirmed(status) => (status, LifecycleEffect::None),
    }
}
