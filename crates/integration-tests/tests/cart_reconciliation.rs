//! Cart reconciliation scenarios: remote-first loading, shadow-cache
//! fallback, mutation sync, and the shadow persist that follows every
//! mutation.

use cartwheel_core::{Cart, ProductId, QuantityChange};
use cartwheel_integration_tests::{Call, FakeGateway, authed_store, cart_item, product};
use cartwheel_storefront::AppError;
use cartwheel_storefront::cart::CartManager;
use cartwheel_storefront::session::keys;
use cartwheel_storefront::storage::{KeyValueStore, MemoryStore};

fn pid(id: &str) -> ProductId {
    ProductId::new(id)
}

#[tokio::test]
async fn anonymous_load_uses_local_cache_and_never_calls_remote() {
    let gateway = FakeGateway::new();
    let store = MemoryStore::new();
    store
        .set_json(
            keys::ANONYMOUS_CART,
            &Cart::from_items(vec![cart_item("p1", 250, 2)]),
        )
        .expect("seed anonymous cart");

    let mut manager = CartManager::new(gateway.clone(), store);
    manager.load().await;

    assert_eq!(manager.items().len(), 1);
    assert_eq!(manager.item_count(), 2);
    assert!(gateway.calls().is_empty(), "no remote call for anonymous load");
}

#[tokio::test]
async fn anonymous_load_without_cache_yields_empty_cart() {
    let gateway = FakeGateway::new();
    let mut manager = CartManager::new(gateway.clone(), MemoryStore::new());
    manager.load().await;

    assert!(manager.items().is_empty());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn authenticated_load_prefers_remote_cart() {
    let gateway = FakeGateway::new();
    gateway.seed_remote_cart(vec![cart_item("p1", 250, 1), cart_item("p2", 999, 3)]);
    let store = authed_store();
    // A stale shadow cart must lose to remote truth.
    store
        .set_json(
            &keys::user_cart(&"u1".into()),
            &Cart::from_items(vec![cart_item("stale", 100, 9)]),
        )
        .expect("seed shadow cart");

    let mut manager = CartManager::new(gateway.clone(), store);
    manager.load().await;

    assert_eq!(manager.items().len(), 2);
    assert!(manager.items().iter().all(|i| i.product_id != pid("stale")));
    assert_eq!(gateway.calls(), vec![Call::FetchCart]);
}

#[tokio::test]
async fn empty_remote_cart_falls_back_to_user_shadow() {
    let gateway = FakeGateway::new();
    let store = authed_store();
    store
        .set_json(
            &keys::user_cart(&"u1".into()),
            &Cart::from_items(vec![cart_item("p1", 250, 4)]),
        )
        .expect("seed shadow cart");

    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    assert_eq!(manager.item_count(), 4);
}

#[tokio::test]
async fn remote_failure_degrades_to_shadow_cache_silently() {
    let gateway = FakeGateway::new();
    gateway.fail_fetch_cart();
    let store = authed_store();
    store
        .set_json(
            &keys::user_cart(&"u1".into()),
            &Cart::from_items(vec![cart_item("p1", 250, 1)]),
        )
        .expect("seed shadow cart");

    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    assert_eq!(manager.items().len(), 1);
}

#[tokio::test]
async fn anonymous_cart_is_abandoned_after_login() {
    // Identity transitions do not merge carts; the anonymous cart stays
    // where it is and the user's own (empty) state wins.
    let gateway = FakeGateway::new();
    let store = authed_store();
    store
        .set_json(
            keys::ANONYMOUS_CART,
            &Cart::from_items(vec![cart_item("p1", 250, 5)]),
        )
        .expect("seed anonymous cart");

    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    assert!(manager.items().is_empty());
}

#[tokio::test]
async fn add_item_increments_existing_line_without_duplicating() {
    let gateway = FakeGateway::new();
    gateway.seed_remote_cart(vec![cart_item("p1", 250, 1)]);
    let mut manager = CartManager::new(gateway.clone(), authed_store());
    manager.load().await;

    let quantity = manager.add_item(&pid("p1")).await.expect("add succeeds");

    assert_eq!(quantity, 2);
    assert_eq!(manager.items().len(), 1, "still keyed uniquely by product");
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Upsert { .. })),
        vec![Call::Upsert {
            product_id: pid("p1"),
            quantity: 2
        }]
    );
    assert!(
        gateway
            .calls_where(|c| matches!(c, Call::FetchProduct(_)))
            .is_empty(),
        "existing line needs no catalog fetch"
    );
}

#[tokio::test]
async fn add_item_fetches_details_for_new_product() {
    let gateway = FakeGateway::new();
    gateway.seed_product(product("p7", 1299));
    let mut manager = CartManager::new(gateway.clone(), authed_store());
    manager.load().await;

    let quantity = manager.add_item(&pid("p7")).await.expect("add succeeds");

    assert_eq!(quantity, 1);
    let item = manager.items().first().expect("one item");
    assert_eq!(item.title, "Product p7");
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::FetchProduct(_))),
        vec![Call::FetchProduct(pid("p7"))]
    );
}

#[tokio::test]
async fn add_item_requires_authentication() {
    let gateway = FakeGateway::new();
    let mut manager = CartManager::new(gateway.clone(), MemoryStore::new());
    manager.load().await;

    let err = manager.add_item(&pid("p1")).await.expect_err("rejected");
    assert!(matches!(err, AppError::Unauthenticated));
    assert!(gateway.calls().is_empty(), "rejected before any remote call");
}

#[tokio::test]
async fn rejected_upsert_leaves_cart_unchanged() {
    let gateway = FakeGateway::new();
    gateway.seed_remote_cart(vec![cart_item("p1", 250, 1)]);
    let mut manager = CartManager::new(gateway.clone(), authed_store());
    manager.load().await;
    gateway.fail_cart_writes();

    assert!(manager.add_item(&pid("p1")).await.is_err());
    assert_eq!(manager.item_count(), 1);
}

#[tokio::test]
async fn change_quantity_to_zero_removes_line_and_issues_removal() {
    let gateway = FakeGateway::new();
    gateway.seed_remote_cart(vec![cart_item("p1", 250, 1)]);
    let store = authed_store();
    let mut manager = CartManager::new(gateway.clone(), store);
    manager.load().await;

    let change = manager.change_quantity(&pid("p1"), -1).await;

    assert_eq!(change, Some(QuantityChange::Removed));
    assert!(manager.items().is_empty());
    assert_eq!(manager.subtotal(), rust_decimal::Decimal::ZERO);
    assert_eq!(
        gateway.calls_where(|c| matches!(c, Call::Remove { .. })),
        vec![Call::Remove {
            product_id: pid("p1")
        }]
    );
}

#[tokio::test]
async fn change_quantity_survives_remote_write_failure() {
    // Shadow persist is unconditional: the local mutation lands and is
    // cached even when the remote write fails, so the two may diverge.
    let gateway = FakeGateway::new();
    gateway.seed_remote_cart(vec![cart_item("p1", 250, 2)]);
    let store = authed_store();
    let mut manager = CartManager::new(gateway.clone(), store);
    manager.load().await;
    gateway.fail_cart_writes();

    let change = manager.change_quantity(&pid("p1"), 3).await;

    assert_eq!(change, Some(QuantityChange::Updated(5)));
}

#[tokio::test]
async fn anonymous_quantity_change_mutates_local_only() {
    let gateway = FakeGateway::new();
    let store = MemoryStore::new();
    store
        .set_json(
            keys::ANONYMOUS_CART,
            &Cart::from_items(vec![cart_item("p1", 250, 2)]),
        )
        .expect("seed anonymous cart");
    let mut manager = CartManager::new(gateway.clone(), store);
    manager.load().await;

    let change = manager.change_quantity(&pid("p1"), -1).await;

    assert_eq!(change, Some(QuantityChange::Updated(1)));
    assert!(gateway.calls().is_empty(), "anonymous mutations stay local");
}

#[tokio::test]
async fn change_quantity_on_missing_product_is_noop() {
    let gateway = FakeGateway::new();
    let mut manager = CartManager::new(gateway.clone(), authed_store());
    manager.load().await;

    assert_eq!(manager.change_quantity(&pid("ghost"), 1).await, None);
    assert_eq!(gateway.calls(), vec![Call::FetchCart]);
}

#[tokio::test]
async fn mutations_update_the_shadow_cache_for_the_identity() {
    let gateway = FakeGateway::new();
    gateway.seed_remote_cart(vec![cart_item("p1", 250, 2)]);
    let store = authed_store();
    let mut manager = CartManager::new(gateway, &store);
    manager.load().await;

    let change = manager.change_quantity(&pid("p1"), 1).await;
    assert_eq!(change, Some(QuantityChange::Updated(3)));

    let shadow: Cart = store
        .get_json(&keys::user_cart(&"u1".into()))
        .expect("read shadow")
        .expect("shadow persisted");
    assert_eq!(shadow.get(&pid("p1")).map(|i| i.quantity), Some(3));
}

#[tokio::test]
async fn anonymous_mutations_shadow_to_the_anonymous_key() {
    let gateway = FakeGateway::new();
    let store = MemoryStore::new();
    store
        .set_json(
            keys::ANONYMOUS_CART,
            &Cart::from_items(vec![cart_item("p1", 250, 2)]),
        )
        .expect("seed anonymous cart");
    let mut manager = CartManager::new(gateway, &store);
    manager.load().await;

    manager.remove_item(&pid("p1")).await;

    let shadow: Cart = store
        .get_json(keys::ANONYMOUS_CART)
        .expect("read shadow")
        .expect("shadow persisted");
    assert!(shadow.is_empty());
}
