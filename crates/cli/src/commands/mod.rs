//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use cartwheel_storefront::config::StorefrontConfig;
use cartwheel_storefront::gateway::RestGateway;
use cartwheel_storefront::storage::JsonFileStore;

/// Build the gateway and file store every command runs against.
pub fn context() -> Result<(RestGateway, JsonFileStore), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let gateway = RestGateway::new(&config)?;
    let store = JsonFileStore::open(&config.state_file)?;
    Ok((gateway, store))
}
