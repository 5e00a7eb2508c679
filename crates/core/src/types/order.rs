//! Orders and the cancellation grace window.
//!
//! Order lines are snapshots frozen at placement time; they never read back
//! through to the live catalog. The grace window is client-local and is
//! recomputed from `created_at` on every load, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, ProductId};
use crate::types::price::Price;
use crate::types::status::OrderStatus;

/// Seconds after placement during which an order may still be cancelled.
pub const GRACE_SECONDS: i64 = 10;

/// Seconds left in the cancellation window for an order created at
/// `created_at`, observed at `now`. Floors at 0; orders already past the
/// window start there.
#[must_use]
pub fn remaining_seconds(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed = now.signed_duration_since(created_at).num_seconds();
    u64::try_from(GRACE_SECONDS.saturating_sub(elapsed).max(0)).unwrap_or(0)
}

/// One product line inside an order: a frozen snapshot of the product at
/// placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub quantity: u32,
    /// Whether the actor already reviewed this product for this order.
    #[serde(default)]
    pub is_reviewed: bool,
}

/// An order as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub products: Vec<OrderLine>,
}

impl Order {
    /// Order total: sum of frozen line prices times quantities.
    #[must_use]
    pub fn total(&self) -> rust_decimal::Decimal {
        self.products
            .iter()
            .map(|line| line.price.line_total(line.quantity))
            .sum()
    }
}
