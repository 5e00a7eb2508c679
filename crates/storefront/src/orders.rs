//! Order lifecycle tracker.
//!
//! Owns per-order cancellation countdowns and keeps displayed statuses
//! consistent with server-confirmed state. All precedence decisions go
//! through the core lifecycle reducer; this module only performs the
//! effects it is told to.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, instrument, warn};

use cartwheel_core::{
    LifecycleEffect, LifecycleEvent, Order, OrderId, OrderStatus, ProductId, reduce,
    remaining_seconds,
};

use crate::error::{AppError, Result};
use crate::gateway::CommerceApi;
use crate::gateway::types::ReviewRequest;
use crate::session;
use crate::storage::KeyValueStore;

/// What a cancellation attempt amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Remote side accepted; the order is Cancelled.
    Cancelled,
    /// Remote side rejected as expired; the order reconciled to
    /// Successful. Callers surface this distinctly from generic failures.
    AlreadyConfirmed,
    /// Guard said no (window at 0 or order already terminal); no request
    /// was issued.
    Ignored,
}

/// Result of one spawned confirmation call; `None` when the call failed
/// and the order stays as it was locally.
type ConfirmOutcome = (OrderId, Option<OrderStatus>);

/// Tracks the actor's orders and their cancellation windows.
pub struct OrderTracker<G, S> {
    gateway: G,
    store: S,
    orders: Vec<Order>,
    /// Remaining window seconds per Pending order. Client-local, never
    /// persisted; recomputed from `created_at` on each load.
    timers: HashMap<OrderId, u64>,
    /// Orders with a spawned confirmation call still in flight.
    in_flight: HashSet<OrderId>,
    outcomes_tx: UnboundedSender<ConfirmOutcome>,
    outcomes_rx: UnboundedReceiver<ConfirmOutcome>,
}

impl<G, S> OrderTracker<G, S>
where
    G: CommerceApi + Clone + Send + Sync + 'static,
    S: KeyValueStore,
{
    pub fn new(gateway: G, store: S) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            store,
            orders: Vec::new(),
            timers: HashMap::new(),
            in_flight: HashSet::new(),
            outcomes_tx,
            outcomes_rx,
        }
    }

    /// Orders as currently displayed.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Remaining cancellation window for an order, 0 when untracked.
    #[must_use]
    pub fn remaining(&self, order_id: &OrderId) -> u64 {
        self.timers.get(order_id).copied().unwrap_or(0)
    }

    /// Whether any order still has a tracked window awaiting expiry or
    /// confirmation. In-flight confirmation calls count: their outcomes
    /// are delivered through later ticks.
    #[must_use]
    pub fn has_active_windows(&self) -> bool {
        !self.timers.is_empty() || !self.in_flight.is_empty()
    }

    /// Fetch the actor's orders and initialize countdown timers.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthenticated`] for anonymous sessions (the caller
    /// routes to login); gateway errors pass through.
    #[instrument(skip(self, now))]
    pub async fn load(&mut self, now: DateTime<Utc>) -> Result<()> {
        let identity = session::require_identity(&self.store)?;
        self.orders = self.gateway.list_orders(&identity.token).await?;
        self.initialize_timers(now);
        Ok(())
    }

    /// Compute `max(0, GRACE_SECONDS - elapsed)` for every Pending order.
    /// Orders already past the window start at 0 and are picked up by the
    /// next tick.
    pub fn initialize_timers(&mut self, now: DateTime<Utc>) {
        // Windows are re-derived from the freshly loaded orders; any
        // confirmation still in flight for the previous list reconciles
        // through its drained outcome like any other server answer.
        self.in_flight.clear();
        self.timers = self
            .orders
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .map(|order| (order.id.clone(), remaining_seconds(order.created_at, now)))
            .collect();
    }

    /// One second of countdown.
    ///
    /// Applies any confirmation outcomes that arrived since the last tick,
    /// then decrements every positive timer; the instant one reaches 0,
    /// the confirmation call is spawned fire-and-forget. The cadence never
    /// waits on the network: a slow confirmation leaves every other
    /// countdown running, and its result lands through a later tick's
    /// drain. A failed confirmation is logged and retried by nothing - the
    /// order stays Pending locally until a later load reconciles it.
    /// Orders whose window was already 0 when timers were initialized are
    /// confirmed on the first tick.
    #[instrument(skip(self))]
    pub fn tick(&mut self) {
        self.drain_confirmations();

        let mut expired: Vec<OrderId> = Vec::new();
        for (order_id, remaining) in &mut self.timers {
            if *remaining > 0 {
                *remaining -= 1;
            }
            if *remaining == 0 {
                expired.push(order_id.clone());
            }
        }

        for order_id in expired {
            // One confirmation attempt per expiry: the timer entry retires
            // whether or not the call lands.
            self.timers.remove(&order_id);
            let Some(order) = self.orders.iter().find(|o| o.id == order_id) else {
                continue;
            };
            let (_, effect) = reduce(order.status, LifecycleEvent::TickExpired);
            if effect == LifecycleEffect::RequestConfirmation {
                self.spawn_confirmation(order_id);
            }
        }
    }

    /// Attempt to cancel an order.
    ///
    /// A window already at 0 (or a terminal order) is a guarded no-op: no
    /// request is issued and whatever tick-driven confirmation is in
    /// flight proceeds undisturbed. An expired rejection from the remote
    /// side reconciles the order to Successful. Any other failure leaves
    /// the status untouched and surfaces as a retryable error.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] for untracked orders,
    /// [`AppError::Unauthenticated`] for anonymous sessions, and gateway
    /// errors other than the expired rejection.
    #[instrument(skip(self))]
    pub async fn cancel(&mut self, order_id: &OrderId) -> Result<CancelOutcome> {
        let order = self
            .orders
            .iter()
            .find(|o| &o.id == order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

        let remaining = self.remaining(order_id);
        let (_, effect) = reduce(order.status, LifecycleEvent::CancelRequested { remaining });
        if effect != LifecycleEffect::RequestCancellation {
            return Ok(CancelOutcome::Ignored);
        }

        let identity = session::require_identity(&self.store)?;
        match self.gateway.cancel_order(&identity.token, order_id).await {
            Ok(()) => {
                self.apply_remote_status(order_id, OrderStatus::Cancelled);
                Ok(CancelOutcome::Cancelled)
            }
            Err(crate::gateway::GatewayError::CancellationExpired) => {
                // Server truth: the window lapsed before the request
                // landed. Reconcile instead of erroring.
                self.apply_remote_status(order_id, OrderStatus::Successful);
                Ok(CancelOutcome::AlreadyConfirmed)
            }
            Err(e) => {
                error!("Failed to cancel order {order_id}: {e}");
                Err(e.into())
            }
        }
    }

    /// Submit a review for a product line of a Successful order and mark
    /// the line reviewed.
    ///
    /// # Errors
    ///
    /// Validation (rating range, order state, already-reviewed line),
    /// authentication, or the gateway call.
    #[instrument(skip(self, review_text))]
    pub async fn submit_review(
        &mut self,
        order_id: &OrderId,
        product_id: &ProductId,
        rating: u8,
        review_text: String,
        is_anonymous: bool,
    ) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }

        let order = self
            .orders
            .iter()
            .find(|o| &o.id == order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
        if order.status != OrderStatus::Successful {
            return Err(AppError::Validation(
                "only successful orders can be reviewed".to_string(),
            ));
        }
        let line = order
            .products
            .iter()
            .find(|line| &line.product_id == product_id)
            .ok_or_else(|| AppError::NotFound(format!("product {product_id} in order")))?;
        if line.is_reviewed {
            return Err(AppError::Validation(
                "this product was already reviewed for this order".to_string(),
            ));
        }

        let identity = session::require_identity(&self.store)?;
        self.gateway
            .submit_review(
                &identity.token,
                &ReviewRequest {
                    product_id: product_id.clone(),
                    order_id: order_id.clone(),
                    rating,
                    review_text,
                    is_anonymous,
                },
            )
            .await?;

        if let Some(line) = self.orders.iter_mut().find(|o| &o.id == order_id).and_then(
            |order| {
                order
                    .products
                    .iter_mut()
                    .find(|line| &line.product_id == product_id)
            },
        ) {
            line.is_reviewed = true;
        }
        Ok(())
    }

    /// Spawn the expiry confirmation for one order; its outcome arrives
    /// through the channel drained by later ticks.
    fn spawn_confirmation(&mut self, order_id: OrderId) {
        let Some(identity) = session::current_identity(&self.store) else {
            warn!("Skipping order confirmation {order_id}: no stored credential");
            return;
        };
        self.in_flight.insert(order_id.clone());
        let gateway = self.gateway.clone();
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let status = match gateway.confirm_order(&identity.token, &order_id).await {
                Ok(()) => Some(OrderStatus::Successful),
                Err(e) => {
                    error!("Failed to confirm order {order_id}: {e}");
                    None
                }
            };
            // The tracker may have been dropped; nothing left to notify.
            let _ = outcomes.send((order_id, status));
        });
    }

    /// Apply every confirmation outcome that has landed since the last
    /// drain.
    fn drain_confirmations(&mut self) {
        while let Ok((order_id, status)) = self.outcomes_rx.try_recv() {
            self.in_flight.remove(&order_id);
            if let Some(status) = status {
                self.apply_remote_status(&order_id, status);
            }
        }
    }

    /// Apply a server-confirmed status through the reducer (last write
    /// wins) and retire the order's timer.
    fn apply_remote_status(&mut self, order_id: &OrderId, status: OrderStatus) {
        if let Some(order) = self.orders.iter_mut().find(|o| &o.id == order_id) {
            let (next, _) = reduce(order.status, LifecycleEvent::RemoteConfirmed(status));
            if next != order.status {
                // Server truth overrides even moves the local status
                // machine would reject, e.g. when both race responses
                // land out of order; keep a trace of those.
                if let Err(e) = order.status.transition(next) {
                    warn!("Out-of-band remote status for order {order_id}: {e}");
                }
                order.status = next;
            }
            if next.is_terminal() {
                self.timers.remove(order_id);
            }
        }
    }
}
