//! Cart reconciliation manager.
//!
//! Presents one unified item list whether the backing store is the remote
//! cart or the local shadow cache, and keeps both in sync. The remote side
//! stays authoritative for authenticated actors; every in-memory mutation
//! also re-serializes the whole cart to the shadow cache under the current
//! identity key, even when the preceding remote call failed, so the two
//! can diverge until the next reconciling load.
//!
//! Identity transitions do not merge carts: logging in switches the
//! manager to the user's remote/shadow cart and abandons `anonymousCart`
//! where it lies.

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use cartwheel_core::{Cart, CartItem, ProductId, QuantityChange};

use crate::error::{AppError, Result};
use crate::gateway::CommerceApi;
use crate::gateway::types::PlaceOrderLine;
use crate::session;
use crate::storage::KeyValueStore;

/// Owns the in-memory cart and its reconciliation with remote and local
/// state.
pub struct CartManager<G, S> {
    gateway: G,
    store: S,
    cart: Cart,
}

impl<G, S> CartManager<G, S>
where
    G: CommerceApi + Clone + Send + Sync + 'static,
    S: KeyValueStore,
{
    pub fn new(gateway: G, store: S) -> Self {
        Self {
            gateway,
            store,
            cart: Cart::new(),
        }
    }

    /// Items the current actor intends to purchase.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    /// Load the cart for the current identity.
    ///
    /// Authenticated: fetch the remote cart; an empty remote cart or a
    /// failed fetch falls back to the actor's shadow cache. Anonymous:
    /// the shared anonymous cache, with no remote call ever issued.
    /// Always resolves to some list; failures are logged, never returned.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        self.cart = match session::current_identity(&self.store) {
            Some(identity) => {
                match self
                    .gateway
                    .fetch_cart(&identity.token, &identity.user_id)
                    .await
                {
                    Ok(items) if !items.is_empty() => Cart::from_items(items),
                    Ok(_) => self.shadow_cart(),
                    Err(e) => {
                        warn!("Failed to fetch remote cart, using shadow cache: {e}");
                        self.shadow_cart()
                    }
                }
            }
            None => self.shadow_cart(),
        };
    }

    /// Add one unit of a product.
    ///
    /// An existing line's quantity goes up by 1; a new product is fetched
    /// from the catalog and appended with quantity 1. The remote upsert
    /// carries the new total and is issued before the in-memory update, so
    /// a rejected call leaves the cart untouched. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthenticated`] for anonymous actors; gateway errors
    /// pass through.
    #[instrument(skip(self))]
    pub async fn add_item(&mut self, product_id: &ProductId) -> Result<u32> {
        let identity = session::require_identity(&self.store)?;

        let new_quantity = self
            .cart
            .get(product_id)
            .map_or(1, |item| item.quantity.saturating_add(1));

        self.gateway
            .upsert_cart_item(&identity.token, &identity.user_id, product_id, new_quantity)
            .await?;

        if self.cart.increment(product_id).is_none() {
            let doc = self
                .gateway
                .fetch_product(&identity.token, product_id)
                .await?;
            self.cart.insert(doc.into_cart_item(1));
        }
        self.shadow_persist();
        Ok(new_quantity)
    }

    /// Apply `delta` to a line's quantity, clamped at 0; reaching 0 removes
    /// the line. The in-memory mutation always applies; the matching remote
    /// write (upsert or removal) is issued for authenticated actors and its
    /// failure only logged. Rapid calls are not coalesced - each issues its
    /// own remote write, and the remote side may observe them out of order.
    ///
    /// Returns `None` when the product is not in the cart.
    #[instrument(skip(self))]
    pub async fn change_quantity(
        &mut self,
        product_id: &ProductId,
        delta: i64,
    ) -> Option<QuantityChange> {
        let change = self.cart.adjust(product_id, delta)?;

        if let Some(identity) = session::current_identity(&self.store) {
            let result = match change {
                QuantityChange::Updated(quantity) => {
                    self.gateway
                        .upsert_cart_item(&identity.token, &identity.user_id, product_id, quantity)
                        .await
                }
                QuantityChange::Removed => {
                    self.gateway
                        .remove_cart_item(&identity.token, &identity.user_id, product_id)
                        .await
                }
            };
            if let Err(e) = result {
                warn!("Failed to push cart quantity update: {e}");
            }
        }

        self.shadow_persist();
        Some(change)
    }

    /// Remove a line regardless of quantity. Issues a remote removal for
    /// authenticated actors (failure logged). Returns whether the line
    /// existed locally.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let existed = self.cart.remove(product_id);

        if let Some(identity) = session::current_identity(&self.store)
            && let Err(e) = self
                .gateway
                .remove_cart_item(&identity.token, &identity.user_id, product_id)
                .await
        {
            warn!("Failed to push cart removal: {e}");
        }

        self.shadow_persist();
        existed
    }

    /// Place an order for the selected products.
    ///
    /// Validation happens before any network call: an empty selection is
    /// rejected, and anonymous actors get [`AppError::Unauthenticated`]
    /// so the caller can route to login. On success, the ordered lines
    /// leave the in-memory cart and their remote removals are spawned
    /// fire-and-forget.
    ///
    /// # Errors
    ///
    /// Validation, authentication, or the order placement call itself.
    #[instrument(skip(self))]
    pub async fn place_order(&mut self, selection: &[ProductId]) -> Result<()> {
        if selection.is_empty() {
            return Err(AppError::Validation(
                "no products selected for order".to_string(),
            ));
        }
        let identity = session::require_identity(&self.store)?;

        let lines: Vec<PlaceOrderLine> = self
            .cart
            .items()
            .iter()
            .filter(|item| selection.contains(&item.product_id))
            .map(|item| PlaceOrderLine {
                product_id: item.product_id.clone(),
                title: item.title.clone(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        if lines.is_empty() {
            return Err(AppError::Validation(
                "selected products are not in the cart".to_string(),
            ));
        }

        self.gateway
            .place_order(&identity.token, &identity.user_id, &lines)
            .await?;

        let ordered = self.cart.drain_products(selection);
        self.shadow_persist();

        // Fire-and-forget: success was already reported by the placement
        // call; stragglers in the remote cart get reconciled on next load.
        for item in ordered {
            let gateway = self.gateway.clone();
            let identity = identity.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway
                    .remove_cart_item(&identity.token, &identity.user_id, &item.product_id)
                    .await
                {
                    warn!(
                        product_id = %item.product_id,
                        "Failed to remove ordered item from remote cart: {e}"
                    );
                }
            });
        }

        Ok(())
    }

    /// Read the shadow cache for the current identity key, empty on any
    /// failure.
    fn shadow_cart(&self) -> Cart {
        let key = session::cart_key(&self.store);
        match self.store.get_json(&key) {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!("Failed to read shadow cart {key}: {e}");
                Cart::new()
            }
        }
    }

    /// Re-serialize the whole cart to the shadow cache. Unconditional after
    /// every mutation; a write failure is logged and the in-memory cart
    /// stays authoritative for this session.
    fn shadow_persist(&self) {
        let key = session::cart_key(&self.store);
        if let Err(e) = self.store.set_json(&key, &self.cart) {
            warn!("Failed to persist shadow cart {key}: {e}");
        }
    }
}
