//! Remote commerce API gateway.
//!
//! # Architecture
//!
//! - The remote API is the source of truth for carts, orders, and the
//!   catalog; this module only calls it, never mirrors it
//! - [`CommerceApi`] is the seam the cart manager and order tracker are
//!   generic over, so tests drive them with scripted fakes
//! - [`RestGateway`] is the production implementation: `reqwest` JSON
//!   calls with a bearer credential per request, no client-side timeout
//!   and no retry - a failed call is the caller's fallback problem
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_storefront::gateway::{CommerceApi, RestGateway};
//!
//! let gateway = RestGateway::new(&config)?;
//! let login = gateway.login("jo@example.com", "hunter2!A").await?;
//! let items = gateway
//!     .fetch_cart(&token, &login.user.id)
//!     .await?;
//! ```

mod rest;
pub mod types;

pub use rest::RestGateway;
pub use types::{LoginResponse, PlaceOrderLine, ProductDoc, ReviewRequest};

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

use cartwheel_core::{CartItem, Order, OrderId, ProductId, UserId};

/// Error message the remote side returns for a cancellation that arrives
/// after the grace window.
pub const CANCELLATION_EXPIRED_MESSAGE: &str = "Cancellation period expired";

/// Errors that can occur when talking to the remote commerce API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credential rejected by the remote side.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the remote side.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Cancellation rejected because the grace window already expired.
    /// Treated as a reconciliation signal, not a failure.
    #[error("Cancellation period expired")]
    CancellationExpired,
}

/// The remote commerce API surface consumed by the storefront.
///
/// Every call except [`login`](Self::login) carries the actor's bearer
/// credential.
pub trait CommerceApi: Send + Sync {
    /// Exchange credentials for a bearer token and the actor record.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse, GatewayError>> + Send;

    /// Fetch the actor's remote cart, flattened into cart items.
    fn fetch_cart(
        &self,
        token: &SecretString,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<CartItem>, GatewayError>> + Send;

    /// Upsert one cart line to the given total quantity.
    fn upsert_cart_item(
        &self,
        token: &SecretString,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Remove one cart line entirely.
    fn remove_cart_item(
        &self,
        token: &SecretString,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Fetch a single product document.
    fn fetch_product(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<ProductDoc, GatewayError>> + Send;

    /// List the catalog.
    fn list_products(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<ProductDoc>, GatewayError>> + Send;

    /// Place an order from frozen line snapshots.
    fn place_order(
        &self,
        token: &SecretString,
        user_id: &UserId,
        lines: &[PlaceOrderLine],
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// List the actor's orders.
    fn list_orders(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<Order>, GatewayError>> + Send;

    /// Confirm a pending order (Pending -> Successful).
    fn confirm_order(
        &self,
        token: &SecretString,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Cancel a pending order.
    ///
    /// A late cancellation comes back as
    /// [`GatewayError::CancellationExpired`].
    fn cancel_order(
        &self,
        token: &SecretString,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Submit a product review for a delivered order line.
    fn submit_review(
        &self,
        token: &SecretString,
        review: &ReviewRequest,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
