//! Cart values and their mutation rules.
//!
//! A cart is an unordered set of items keyed uniquely by product ID. All
//! quantity arithmetic lives here so the reconciliation manager only decides
//! *when* to mutate, never *how*.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::price::Price;

/// A single cart line: a product reference plus display fields and quantity.
///
/// Serialized form matches the local shadow-cache shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product this line refers to. Unique within a cart.
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub image_url: String,
    pub description: String,
    /// Always at least 1 while the item is present; reaching 0 removes it.
    pub quantity: u32,
}

/// Result of adjusting an item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Item remains with the given new quantity.
    Updated(u32),
    /// Quantity reached 0 and the item left the cart.
    Removed,
}

/// The in-memory cart: items keyed uniquely by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from items, keeping the first occurrence of each
    /// product ID.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if cart.get(&item.product_id).is_none() {
                cart.items.push(item);
            }
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price.line_total(i.quantity))
            .sum()
    }

    /// Increment an existing line's quantity by 1, returning the new
    /// quantity, or `None` if the product is not in the cart.
    pub fn increment(&mut self, product_id: &ProductId) -> Option<u32> {
        let item = self
            .items
            .iter_mut()
            .find(|i| &i.product_id == product_id)?;
        item.quantity = item.quantity.saturating_add(1);
        Some(item.quantity)
    }

    /// Insert a new line. Returns `false` (and leaves the cart unchanged)
    /// if the product is already present; carts stay keyed uniquely by
    /// product ID.
    pub fn insert(&mut self, item: CartItem) -> bool {
        if self.get(&item.product_id).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Apply `delta` to a line's quantity, clamping the result to >= 0.
    ///
    /// A resulting quantity of 0 removes the line. Returns `None` if the
    /// product is not in the cart.
    pub fn adjust(&mut self, product_id: &ProductId, delta: i64) -> Option<QuantityChange> {
        let index = self.items.iter().position(|i| &i.product_id == product_id)?;
        let item = self.items.get_mut(index)?;
        let new_quantity = i64::from(item.quantity).saturating_add(delta).max(0);
        if new_quantity == 0 {
            self.items.remove(index);
            return Some(QuantityChange::Removed);
        }
        // Clamp fits: quantity was clamped at 0 and saturating math keeps it
        // within i64, so the u32 conversion only truncates absurd deltas.
        item.quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        Some(QuantityChange::Updated(item.quantity))
    }

    /// Remove a line regardless of quantity. Returns `true` if it existed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() != before
    }

    /// Remove and return every line whose product is in `product_ids`.
    pub fn drain_products(&mut self, product_ids: &[ProductId]) -> Vec<CartItem> {
        let (taken, kept) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| product_ids.contains(&i.product_id));
        self.items = kept;
        taken
    }
}
