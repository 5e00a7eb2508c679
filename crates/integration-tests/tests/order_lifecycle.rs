//! Order lifecycle: the cancellation window countdown, expiry-driven
//! confirmation, cancellation outcomes, and reviews.

use std::time::Duration;

use chrono::Utc;
use cartwheel_core::{GRACE_SECONDS, OrderStatus, ProductId};
use cartwheel_integration_tests::{
    Call, CancelBehavior, FakeGateway, authed_store, order, order_id,
};
use cartwheel_storefront::AppError;
use cartwheel_storefront::orders::{CancelOutcome, OrderTracker};
use cartwheel_storefront::storage::MemoryStore;

fn pid(id: &str) -> ProductId {
    ProductId::new(id)
}

/// Let spawned confirmation calls run to completion on the test runtime.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn anonymous_load_reports_unauthenticated() {
    let gateway = FakeGateway::new();
    let mut tracker = OrderTracker::new(gateway.clone(), MemoryStore::new());

    let err = tracker.load(Utc::now()).await.expect_err("rejected");
    assert!(matches!(err, AppError::Unauthenticated));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn fresh_pending_order_counts_down_and_confirms_once() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 0, now, &[("p1", 1)])]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let grace = u64::try_from(GRACE_SECONDS).expect("grace fits");
    assert_eq!(tracker.remaining(&id), grace);

    // The window survives every tick but the last.
    for elapsed in 1..grace {
        tracker.tick();
        assert_eq!(tracker.remaining(&id), grace - elapsed);
        assert!(
            gateway
                .calls_where(|c| matches!(c, Call::Confirm(_)))
                .is_empty()
        );
    }

    tracker.tick();
    // The confirmation is in flight; the watch stays alive until its
    // outcome lands through a later tick.
    assert!(tracker.has_active_windows());
    settle().await;
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Confirm(_))),
        vec![Call::Confirm(id.clone())]
    );

    tracker.tick();
    assert_eq!(tracker.orders()[0].status, OrderStatus::Successful);
    assert!(!tracker.has_active_windows());

    // Further ticks are inert.
    tracker.tick();
    settle().await;
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Confirm(_))).len(),
        1
    );
}

#[tokio::test]
async fn order_loaded_past_its_window_confirms_on_the_first_tick() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 15, now, &[("p1", 1)])]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    assert_eq!(tracker.remaining(&id), 0);
    assert!(tracker.has_active_windows());

    tracker.tick();
    settle().await;
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Confirm(_))),
        vec![Call::Confirm(id.clone())]
    );
    tracker.tick();
    assert_eq!(tracker.orders()[0].status, OrderStatus::Successful);
}

#[tokio::test(start_paused = true)]
async fn tick_cadence_survives_a_slow_confirmation_call() {
    let now = Utc::now();
    let expired = order_id();
    let fresh = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![
        order(&expired, OrderStatus::Pending, 15, now, &[("p1", 1)]),
        order(&fresh, OrderStatus::Pending, 0, now, &[("p2", 1)]),
    ]);
    gateway.confirm_delay(Duration::from_secs(3));
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let started = tokio::time::Instant::now();
    tracker.tick();
    // Expiry only spawns the call; no time was consumed waiting on it, and
    // the other order's countdown keeps moving on later ticks.
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(tracker.remaining(&fresh), 9);
    tracker.tick();
    assert_eq!(tracker.remaining(&fresh), 8);
    assert!(tracker.has_active_windows());

    // Let the held response land, then drain it.
    tokio::time::sleep(Duration::from_secs(4)).await;
    tracker.tick();
    let status = tracker
        .orders()
        .iter()
        .find(|o| o.id == expired)
        .map(|o| o.status);
    assert_eq!(status, Some(OrderStatus::Successful));
    assert_eq!(tracker.remaining(&fresh), 7);
}

#[tokio::test]
async fn terminal_orders_get_no_countdown() {
    let now = Utc::now();
    let successful = order_id();
    let cancelled = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![
        order(&successful, OrderStatus::Successful, 2, now, &[("p1", 1)]),
        order(&cancelled, OrderStatus::Cancelled, 2, now, &[("p2", 1)]),
    ]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    assert!(!tracker.has_active_windows());
    tracker.tick();
    settle().await;
    assert!(
        gateway
            .calls_where(|c| matches!(c, Call::Confirm(_)))
            .is_empty()
    );
}

#[tokio::test]
async fn cancel_inside_the_window_cancels_the_order() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 3, now, &[("p1", 1)])]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let outcome = tracker.cancel(&id).await.expect("cancel accepted");
    assert_eq!(outcome, CancelOutcome::Cancelled);
    assert_eq!(tracker.orders()[0].status, OrderStatus::Cancelled);
    assert!(!tracker.has_active_windows());
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Cancel(_))),
        vec![Call::Cancel(id.clone())]
    );

    // A cancelled order never gets confirmed by later ticks.
    tracker.tick();
    settle().await;
    assert!(
        gateway
            .calls_where(|c| matches!(c, Call::Confirm(_)))
            .is_empty()
    );
}

#[tokio::test]
async fn cancel_after_the_window_lapses_is_ignored_locally() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 15, now, &[("p1", 1)])]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let outcome = tracker.cancel(&id).await.expect("guarded no-op");
    assert_eq!(outcome, CancelOutcome::Ignored);
    assert_eq!(tracker.orders()[0].status, OrderStatus::Pending);
    assert!(
        gateway
            .calls_where(|c| matches!(c, Call::Cancel(_)))
            .is_empty()
    );
}

#[tokio::test]
async fn cancel_rejected_as_expired_reconciles_to_successful() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 8, now, &[("p1", 1)])]);
    gateway.cancel_behavior(CancelBehavior::Expired);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let outcome = tracker.cancel(&id).await.expect("reconciled");
    assert_eq!(outcome, CancelOutcome::AlreadyConfirmed);
    assert_eq!(tracker.orders()[0].status, OrderStatus::Successful);
    assert!(!tracker.has_active_windows());
}

#[tokio::test]
async fn cancel_failure_leaves_the_order_pending_and_retryable() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 3, now, &[("p1", 1)])]);
    gateway.cancel_behavior(CancelBehavior::Fail);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let err = tracker.cancel(&id).await.expect_err("server error");
    assert!(matches!(err, AppError::Gateway(_)));
    assert_eq!(tracker.orders()[0].status, OrderStatus::Pending);
    // The window keeps counting; the user may retry.
    assert!(tracker.has_active_windows());
}

#[tokio::test]
async fn cancel_of_an_untracked_order_is_not_found() {
    let gateway = FakeGateway::new();
    let mut tracker = OrderTracker::new(gateway, authed_store());

    let err = tracker.cancel(&order_id()).await.expect_err("unknown id");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn failed_confirmation_is_attempted_exactly_once_per_expiry() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 15, now, &[("p1", 1)])]);
    gateway.fail_confirm();
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    tracker.tick();
    settle().await;
    tracker.tick();
    // Locally still Pending; a later reload reconciles with the server.
    assert_eq!(tracker.orders()[0].status, OrderStatus::Pending);
    assert!(!tracker.has_active_windows());

    tracker.tick();
    tracker.tick();
    settle().await;
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Confirm(_))).len(),
        1
    );
}

#[tokio::test]
async fn review_of_a_successful_order_marks_the_line_reviewed() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(
        &id,
        OrderStatus::Successful,
        60,
        now,
        &[("p1", 2)],
    )]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    tracker
        .submit_review(&id, &pid("p1"), 4, "Solid.".to_string(), false)
        .await
        .expect("review accepted");
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Review(_))).len(),
        1
    );
    assert!(tracker.orders()[0].products[0].is_reviewed);

    // The same line cannot be reviewed twice.
    let err = tracker
        .submit_review(&id, &pid("p1"), 5, "Again.".to_string(), false)
        .await
        .expect_err("duplicate review");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn review_rating_must_be_between_one_and_five() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(
        &id,
        OrderStatus::Successful,
        60,
        now,
        &[("p1", 1)],
    )]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    for rating in [0, 6] {
        let err = tracker
            .submit_review(&id, &pid("p1"), rating, String::new(), false)
            .await
            .expect_err("out of range");
        assert!(matches!(err, AppError::Validation(_)));
    }
    assert!(
        gateway
            .calls_where(|c| matches!(c, Call::Review(_)))
            .is_empty()
    );
}

#[tokio::test]
async fn pending_orders_cannot_be_reviewed() {
    let now = Utc::now();
    let id = order_id();
    let gateway = FakeGateway::new();
    gateway.seed_orders(vec![order(&id, OrderStatus::Pending, 2, now, &[("p1", 1)])]);
    let mut tracker = OrderTracker::new(gateway.clone(), authed_store());
    tracker.load(now).await.expect("orders loaded");

    let err = tracker
        .submit_review(&id, &pid("p1"), 3, String::new(), false)
        .await
        .expect_err("not successful yet");
    assert!(matches!(err, AppError::Validation(_)));
}
