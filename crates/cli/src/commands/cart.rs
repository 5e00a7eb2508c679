//! Cart commands.

use cartwheel_core::{ProductId, QuantityChange};
use cartwheel_storefront::cart::CartManager;

use super::context;

/// Show the reconciled cart for the current identity.
#[allow(clippy::print_stdout)]
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    if manager.items().is_empty() {
        println!("Cart is empty");
        return Ok(());
    }
    for item in manager.items() {
        println!(
            "{}  {} x{}  {}",
            item.product_id, item.price, item.quantity, item.title
        );
    }
    println!("Subtotal: ${:.2} ({} items)", manager.subtotal(), manager.item_count());
    Ok(())
}

/// Add one unit of a product.
#[allow(clippy::print_stdout)]
pub async fn add(product_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    let quantity = manager.add_item(&ProductId::new(product_id)).await?;
    println!("Added {product_id} (quantity now {quantity})");
    Ok(())
}

/// Adjust a line's quantity by a signed delta.
#[allow(clippy::print_stdout)]
pub async fn adjust(product_id: &str, delta: i64) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    match manager.change_quantity(&ProductId::new(product_id), delta).await {
        Some(QuantityChange::Updated(quantity)) => {
            println!("{product_id} quantity now {quantity}");
        }
        Some(QuantityChange::Removed) => println!("{product_id} removed from cart"),
        None => println!("{product_id} is not in the cart"),
    }
    Ok(())
}

/// Remove a line regardless of quantity.
#[allow(clippy::print_stdout)]
pub async fn remove(product_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let mut manager = CartManager::new(gateway, store);
    manager.load().await;

    if manager.remove_item(&ProductId::new(product_id)).await {
        println!("{product_id} removed from cart");
    } else {
        println!("{product_id} was not in the cart");
    }
    Ok(())
}
