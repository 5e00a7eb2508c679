//! Test doubles and fixtures shared by the integration tests.
//!
//! [`FakeGateway`] implements the storefront's `CommerceApi` seam over an
//! in-memory script: tests seed remote state, flip failure switches, and
//! assert on the recorded calls afterwards.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;

use cartwheel_core::{CartItem, Order, OrderId, OrderLine, OrderStatus, Price, ProductId, UserId};
use cartwheel_storefront::gateway::types::{LoginResponse, PlaceOrderLine, ReviewRequest};
use cartwheel_storefront::gateway::{CommerceApi, GatewayError, ProductDoc};
use cartwheel_storefront::session::{StoredUser, keys};
use cartwheel_storefront::storage::{KeyValueStore, MemoryStore};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    FetchCart,
    Upsert { product_id: ProductId, quantity: u32 },
    Remove { product_id: ProductId },
    FetchProduct(ProductId),
    ListProducts,
    PlaceOrder(Vec<PlaceOrderLine>),
    ListOrders,
    Confirm(OrderId),
    Cancel(OrderId),
    Review(ReviewRequest),
}

/// How the fake answers a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelBehavior {
    #[default]
    Accept,
    /// Reject with the expired-window business error.
    Expired,
    /// Reject with a generic server error.
    Fail,
}

#[derive(Debug, Default)]
struct FakeState {
    products: HashMap<ProductId, ProductDoc>,
    remote_cart: Vec<CartItem>,
    orders: Vec<Order>,
    calls: Vec<Call>,
    fail_fetch_cart: bool,
    fail_cart_writes: bool,
    fail_confirm: bool,
    confirm_delay: Option<std::time::Duration>,
    cancel_behavior: CancelBehavior,
}

/// Scripted in-memory implementation of the commerce API.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a catalog product.
    pub fn seed_product(&self, doc: ProductDoc) {
        self.state().products.insert(doc.id.clone(), doc);
    }

    /// Seed the remote cart returned by `fetch_cart`.
    pub fn seed_remote_cart(&self, items: Vec<CartItem>) {
        self.state().remote_cart = items;
    }

    /// Seed the remote order list.
    pub fn seed_orders(&self, orders: Vec<Order>) {
        self.state().orders = orders;
    }

    /// Make `fetch_cart` fail with a server error.
    pub fn fail_fetch_cart(&self) {
        self.state().fail_fetch_cart = true;
    }

    /// Make cart upserts/removals fail with a server error.
    pub fn fail_cart_writes(&self) {
        self.state().fail_cart_writes = true;
    }

    /// Make order confirmation fail with a server error.
    pub fn fail_confirm(&self) {
        self.state().fail_confirm = true;
    }

    /// Hold every confirmation response for the given duration.
    pub fn confirm_delay(&self, delay: std::time::Duration) {
        self.state().confirm_delay = Some(delay);
    }

    /// Choose the cancellation response.
    pub fn cancel_behavior(&self, behavior: CancelBehavior) {
        self.state().cancel_behavior = behavior;
    }

    /// Calls recorded so far, in issue order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls matching a predicate.
    #[must_use]
    pub fn calls_where(&self, predicate: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.state().calls.iter().filter(|c| predicate(c)).cloned().collect()
    }

    fn server_error() -> GatewayError {
        GatewayError::Api {
            status: 500,
            message: "Internal server error".to_string(),
        }
    }
}

impl CommerceApi for FakeGateway {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::Login);
        Ok(LoginResponse {
            token: "fake-token".to_string(),
            user: StoredUser {
                id: UserId::new("u1"),
                name: "Jo Tester".to_string(),
                email: email.to_string(),
                profile_picture: None,
            },
        })
    }

    async fn fetch_cart(
        &self,
        _token: &SecretString,
        _user_id: &UserId,
    ) -> Result<Vec<CartItem>, GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::FetchCart);
        if state.fail_fetch_cart {
            return Err(Self::server_error());
        }
        Ok(state.remote_cart.clone())
    }

    async fn upsert_cart_item(
        &self,
        _token: &SecretString,
        _user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::Upsert {
            product_id: product_id.clone(),
            quantity,
        });
        if state.fail_cart_writes {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn remove_cart_item(
        &self,
        _token: &SecretString,
        _user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::Remove {
            product_id: product_id.clone(),
        });
        if state.fail_cart_writes {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn fetch_product(
        &self,
        _token: &SecretString,
        product_id: &ProductId,
    ) -> Result<ProductDoc, GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::FetchProduct(product_id.clone()));
        state
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("product {product_id}")))
    }

    async fn list_products(&self, _token: &SecretString) -> Result<Vec<ProductDoc>, GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::ListProducts);
        Ok(state.products.values().cloned().collect())
    }

    async fn place_order(
        &self,
        _token: &SecretString,
        _user_id: &UserId,
        lines: &[PlaceOrderLine],
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::PlaceOrder(lines.to_vec()));
        Ok(())
    }

    async fn list_orders(&self, _token: &SecretString) -> Result<Vec<Order>, GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::ListOrders);
        Ok(state.orders.clone())
    }

    async fn confirm_order(
        &self,
        _token: &SecretString,
        order_id: &OrderId,
    ) -> Result<(), GatewayError> {
        let (delay, fail) = {
            let mut state = self.state();
            state.calls.push(Call::Confirm(order_id.clone()));
            (state.confirm_delay, state.fail_confirm)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn cancel_order(
        &self,
        _token: &SecretString,
        order_id: &OrderId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::Cancel(order_id.clone()));
        match state.cancel_behavior {
            CancelBehavior::Accept => Ok(()),
            CancelBehavior::Expired => Err(GatewayError::CancellationExpired),
            CancelBehavior::Fail => Err(Self::server_error()),
        }
    }

    async fn submit_review(
        &self,
        _token: &SecretString,
        review: &ReviewRequest,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.calls.push(Call::Review(review.clone()));
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A store seeded with an authenticated identity for user `u1`.
#[must_use]
pub fn authed_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .set(keys::AUTH_TOKEN, "fake-token")
        .expect("seed token");
    store
        .set(
            keys::USER,
            r#"{"_id": "u1", "name": "Jo Tester", "email": "jo@example.com"}"#,
        )
        .expect("seed user");
    store
}

/// A catalog product document.
#[must_use]
pub fn product(id: &str, price_cents: i64) -> ProductDoc {
    ProductDoc {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        price: Price::new(Decimal::new(price_cents, 2)).expect("valid price"),
        image_url: format!("/images/{id}.jpg"),
        description: format!("Description of {id}"),
    }
}

/// A cart item with the given quantity.
#[must_use]
pub fn cart_item(id: &str, price_cents: i64, quantity: u32) -> CartItem {
    product(id, price_cents).into_cart_item(quantity)
}

/// A fresh order ID.
#[must_use]
pub fn order_id() -> OrderId {
    OrderId::new(uuid::Uuid::new_v4().simple().to_string())
}

/// An order with one line per `(product, quantity)` pair, created at the
/// given offset back from `now`.
#[must_use]
pub fn order(
    id: &OrderId,
    status: OrderStatus,
    created_secs_ago: i64,
    now: DateTime<Utc>,
    lines: &[(&str, u32)],
) -> Order {
    Order {
        id: id.clone(),
        created_at: now - TimeDelta::seconds(created_secs_ago),
        status,
        products: lines
            .iter()
            .map(|(pid, quantity)| OrderLine {
                product_id: ProductId::new(*pid),
                title: format!("Product {pid}"),
                price: Price::new(Decimal::new(500, 2)).expect("valid price"),
                quantity: *quantity,
                is_reviewed: false,
            })
            .collect(),
    }
}
