//! Catalog listing command.

use cartwheel_storefront::gateway::CommerceApi;
use cartwheel_storefront::session;

use super::context;

/// List the product catalog.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let identity = session::require_identity(&store)?;
    let products = gateway.list_products(&identity.token).await?;

    if products.is_empty() {
        println!("No products found");
        return Ok(());
    }
    for product in products {
        println!("{}  {}  {}", product.id, product.price, product.title);
    }
    Ok(())
}
