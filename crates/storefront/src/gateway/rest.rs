//! REST implementation of the commerce gateway.
//!
//! Plain JSON-over-HTTP with a bearer credential per request. Product
//! detail lookups are cached with `moka` (5-minute TTL) since placement
//! snapshots and cart displays re-read the same documents.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use cartwheel_core::{CartItem, Order, OrderId, OrderStatus, ProductId, UserId};

use crate::config::StorefrontConfig;
use crate::gateway::types::{
    AddCartItemRequest, ApiErrorBody, CartEnvelope, LoginRequest, LoginResponse, PlaceOrderLine,
    PlaceOrderRequest, ProductDoc, RemoveCartItemRequest, ReviewRequest, UpdateStatusRequest,
};
use crate::gateway::{CANCELLATION_EXPIRED_MESSAGE, CommerceApi, GatewayError};

/// Client for the remote commerce REST API.
#[derive(Clone)]
pub struct RestGateway {
    inner: Arc<RestGatewayInner>,
}

struct RestGatewayInner {
    client: reqwest::Client,
    base_url: String,
    product_cache: Cache<String, ProductDoc>,
}

impl RestGateway {
    /// Create a new gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().build()?;

        let product_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(RestGatewayInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                product_cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Execute an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<T, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute an authenticated POST request, discarding the response body.
    async fn post_unit<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        token: &SecretString,
        body: &B,
    ) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Execute an authenticated DELETE request with a JSON body.
    async fn delete_unit<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        token: &SecretString,
        body: &B,
    ) -> Result<(), GatewayError> {
        let response = self
            .inner
            .client
            .delete(self.url(path))
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Handle an API response and parse the JSON body.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| GatewayError::Parse(format!("Failed to parse response: {e}")));
        }
        Err(Self::parse_error(response).await)
    }

    /// Accept any 2xx, map everything else to an error.
    async fn expect_success(response: reqwest::Response) -> Result<(), GatewayError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Parse an error response from the remote side.
    async fn parse_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return GatewayError::RateLimited(retry_after);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(ApiErrorBody::into_message);

        // The expired-cancellation rejection is a reconciliation signal,
        // not a generic API failure.
        if message.as_deref() == Some(CANCELLATION_EXPIRED_MESSAGE) {
            return GatewayError::CancellationExpired;
        }

        match status {
            401 | 403 => GatewayError::Unauthorized,
            404 => GatewayError::NotFound(
                message.unwrap_or_else(|| "Resource not found".to_string()),
            ),
            _ => GatewayError::Api {
                status,
                message: message.unwrap_or_else(|| "Unknown error".to_string()),
            },
        }
    }
}

impl CommerceApi for RestGateway {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        let response = self
            .inner
            .client
            .post(self.url("/users/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(
        &self,
        token: &SecretString,
        user_id: &UserId,
    ) -> Result<Vec<CartItem>, GatewayError> {
        let envelope: CartEnvelope = self.get(&format!("/cart/{user_id}"), token).await?;
        Ok(envelope
            .cart
            .map(|cart| {
                cart.items
                    .into_iter()
                    .map(|entry| entry.product.into_cart_item(entry.quantity))
                    .collect()
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self, token))]
    async fn upsert_cart_item(
        &self,
        token: &SecretString,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        self.post_unit(
            "/cart/add",
            token,
            &AddCartItemRequest {
                user_id,
                product_id,
                quantity,
            },
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn remove_cart_item(
        &self,
        token: &SecretString,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), GatewayError> {
        self.delete_unit(
            "/cart/remove",
            token,
            &RemoveCartItemRequest {
                user_id,
                product_id,
            },
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn fetch_product(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<ProductDoc, GatewayError> {
        if let Some(doc) = self.inner.product_cache.get(product_id.as_str()).await {
            return Ok(doc);
        }
        let doc: ProductDoc = self.get(&format!("/products/{product_id}"), token).await?;
        self.inner
            .product_cache
            .insert(product_id.as_str().to_string(), doc.clone())
            .await;
        Ok(doc)
    }

    #[instrument(skip(self, token))]
    async fn list_products(&self, token: &SecretString) -> Result<Vec<ProductDoc>, GatewayError> {
        self.get("/products", token).await
    }

    #[instrument(skip(self, token, lines))]
    async fn place_order(
        &self,
        token: &SecretString,
        user_id: &UserId,
        lines: &[PlaceOrderLine],
    ) -> Result<(), GatewayError> {
        self.post_unit(
            "/orders/placingOrder",
            token,
            &PlaceOrderRequest {
                user_id,
                products: lines,
            },
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>, GatewayError> {
        self.get("/orders", token).await
    }

    #[instrument(skip(self, token))]
    async fn confirm_order(
        &self,
        token: &SecretString,
        order_id: &OrderId,
    ) -> Result<(), GatewayError> {
        self.post_unit(
            &format!("/orders/{order_id}/updateStatus"),
            token,
            &UpdateStatusRequest {
                status: OrderStatus::Successful,
            },
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn cancel_order(
        &self,
        token: &SecretString,
        order_id: &OrderId,
    ) -> Result<(), GatewayError> {
        self.post_unit(
            &format!("/orders/{order_id}/cancel"),
            token,
            &serde_json::json!({}),
        )
        .await
    }

    #[instrument(skip(self, token, review))]
    async fn submit_review(
        &self,
        token: &SecretString,
        review: &ReviewRequest,
    ) -> Result<(), GatewayError> {
        self.post_unit("/reviews", token, review).await
    }
}
