//! Order commands, including the countdown watch loop.

use std::time::Duration;

use chrono::Utc;

use cartwheel_core::{OrderId, OrderStatus, ProductId};
use cartwheel_storefront::cart::CartManager;
use cartwheel_storefront::orders::{CancelOutcome, OrderTracker};

use super::context;

/// Place an order for the given cart products.
#[allow(clippy::print_stdout)]
pub async fn place(product_ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    let selection: Vec<ProductId> = product_ids
        .iter()
        .map(|id| ProductId::new(id.as_str()))
        .collect();
    manager.place_order(&selection).await?;
    println!("Order placed; you have 10 seconds to cancel (cw-cli order watch)");
    Ok(())
}

/// List orders with status and remaining cancellation window.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut tracker = OrderTracker::new(gateway, store);
    tracker.load(Utc::now()).await?;

    if tracker.orders().is_empty() {
        println!("No orders found");
        return Ok(());
    }
    print_orders(&tracker);
    Ok(())
}

/// Tick pending orders once per second until every window resolves.
///
/// The interval lives for the duration of this view; dropping it on exit
/// cancels the countdown rather than suspending it.
#[allow(clippy::print_stdout)]
pub async fn watch() -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut tracker = OrderTracker::new(gateway, store);
    tracker.load(Utc::now()).await?;

    if !tracker.has_active_windows() {
        println!("No pending orders to watch");
        print_orders(&tracker);
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // First tick of a tokio interval fires immediately; skip it so each
    // later tick marks one elapsed second.
    interval.tick().await;
    while tracker.has_active_windows() {
        interval.tick().await;
        tracker.tick();
        print_orders(&tracker);
    }
    println!("All cancellation windows resolved");
    Ok(())
}

/// Cancel a pending order inside its grace window.
#[allow(clippy::print_stdout)]
pub async fn cancel(order_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut tracker = OrderTracker::new(gateway, store);
    tracker.load(Utc::now()).await?;

    match tracker.cancel(&OrderId::new(order_id)).await {
        Ok(CancelOutcome::Cancelled) => println!("Order cancelled successfully"),
        Ok(CancelOutcome::AlreadyConfirmed) => {
            println!("Cancellation period has expired. Order is already confirmed.");
        }
        Ok(CancelOutcome::Ignored) => {
            println!("Order can no longer be cancelled");
        }
        Err(e) => {
            println!("Something went wrong while cancelling the order. Please try again.");
            return Err(e.into());
        }
    }
    Ok(())
}

/// Review a product from a successful order.
#[allow(clippy::print_stdout)]
pub async fn review(
    order_id: &str,
    product_id: &str,
    rating: u8,
    text: String,
    anonymous: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut tracker = OrderTracker::new(gateway, store);
    tracker.load(Utc::now()).await?;

    tracker
        .submit_review(
            &OrderId::new(order_id),
            &ProductId::new(product_id),
            rating,
            text,
            anonymous,
        )
        .await?;
    println!("Review submitted successfully");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_orders<G, S>(tracker: &OrderTracker<G, S>)
where
    G: cartwheel_storefront::gateway::CommerceApi + Clone + Send + Sync + 'static,
    S: cartwheel_storefront::storage::KeyValueStore,
{
    for order in tracker.orders() {
        let window = match order.status {
            OrderStatus::Pending => format!("  {}s remaining to cancel", tracker.remaining(&order.id)),
            OrderStatus::Successful | OrderStatus::Cancelled => String::new(),
        };
        println!(
            "{}  {}  ${:.2}{window}",
            order.id,
            order.status,
            order.total()
        );
    }
}
