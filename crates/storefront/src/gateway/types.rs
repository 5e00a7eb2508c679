//! Wire types for the remote commerce API.
//!
//! The remote side serves Mongo-style documents: `_id` identifiers, product
//! names under either `name` or `title`, camelCase field names. Aliases
//! here absorb that so nothing outside the gateway sees wire quirks.

use serde::{Deserialize, Serialize};

use cartwheel_core::{CartItem, OrderId, Price, ProductId, UserId};

use crate::session::StoredUser;

/// A product document as served by `GET /products/{id}` and nested inside
/// cart responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDoc {
    #[serde(alias = "_id")]
    pub id: ProductId,
    /// Display name; some documents carry `name`, others `title`.
    #[serde(alias = "name")]
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

impl ProductDoc {
    /// Flatten into a cart item with the given quantity.
    #[must_use]
    pub fn into_cart_item(self, quantity: u32) -> CartItem {
        CartItem {
            product_id: self.id,
            title: self.title,
            price: self.price,
            image_url: self.image_url,
            description: self.description,
            quantity,
        }
    }
}

/// Envelope around `GET /cart/{userId}`.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub cart: Option<CartDoc>,
}

/// The cart document inside the envelope.
#[derive(Debug, Deserialize)]
pub struct CartDoc {
    #[serde(default)]
    pub items: Vec<CartEntryDoc>,
}

/// One remote cart entry: a nested product document plus quantity.
#[derive(Debug, Deserialize)]
pub struct CartEntryDoc {
    #[serde(rename = "productId")]
    pub product: ProductDoc,
    pub quantity: u32,
}

/// Body of `POST /cart/add`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Body of `DELETE /cart/remove`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
}

/// One frozen line of `POST /orders/placingOrder`. Price and title are
/// copies taken at placement time, not live catalog references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub price: Price,
}

/// Body of `POST /orders/placingOrder`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest<'a> {
    pub user_id: &'a UserId,
    pub products: &'a [PlaceOrderLine],
}

/// Body of `POST /orders/{id}/updateStatus`.
#[derive(Debug, Serialize)]
pub struct UpdateStatusRequest {
    pub status: cartwheel_core::OrderStatus,
}

/// Body of `POST /users/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /users/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: StoredUser,
}

/// Body of `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub product_id: ProductId,
    pub order_id: OrderId,
    /// 1 to 5 stars.
    pub rating: u8,
    pub review_text: String,
    pub is_anonymous: bool,
}

/// Error body the remote side sends; the field name varies by endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort human-readable message.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}
