//! Actor identity and credential storage.
//!
//! The authenticated actor is whoever the local store's `authToken` and
//! `user` entries describe. Identity resolution is tolerant: a missing or
//! unparseable record simply means anonymous, logged for diagnostics.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use cartwheel_core::UserId;

use crate::error::{AppError, Result};
use crate::gateway::CommerceApi;
use crate::storage::KeyValueStore;

/// Keys in the local store.
pub mod keys {
    use cartwheel_core::UserId;

    /// Bearer credential string.
    pub const AUTH_TOKEN: &str = "authToken";
    /// Serialized actor record.
    pub const USER: &str = "user";
    /// Shadow cart for anonymous sessions.
    pub const ANONYMOUS_CART: &str = "anonymousCart";

    /// Shadow cart for an authenticated actor.
    #[must_use]
    pub fn user_cart(user_id: &UserId) -> String {
        format!("userCart_{user_id}")
    }
}

/// The actor record as persisted in the local store.
///
/// The remote side sends Mongo-style `_id`; the alias accepts either form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// A resolved authenticated identity: who, plus the credential to act as
/// them.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub token: SecretString,
}

/// Resolve the current identity from stored credentials.
///
/// Returns `None` (anonymous) when either entry is missing or the user
/// record fails to parse; both cases are logged, never surfaced.
#[must_use]
pub fn current_identity(store: &impl KeyValueStore) -> Option<Identity> {
    let token = match store.get(keys::AUTH_TOKEN) {
        Ok(token) => token?,
        Err(e) => {
            warn!("Failed to read stored credential: {e}");
            return None;
        }
    };
    let user: StoredUser = match store.get_json(keys::USER) {
        Ok(user) => user?,
        Err(e) => {
            warn!("Failed to parse stored user record: {e}");
            return None;
        }
    };
    Some(Identity {
        user_id: user.id,
        token: SecretString::from(token),
    })
}

/// The shadow-cache key for the current identity: the actor's own cart key
/// when authenticated, the shared anonymous key otherwise.
#[must_use]
pub fn cart_key(store: &impl KeyValueStore) -> String {
    current_identity(store).map_or_else(
        || keys::ANONYMOUS_CART.to_string(),
        |identity| keys::user_cart(&identity.user_id),
    )
}

/// Log in against the remote API and persist the credential and actor
/// record.
///
/// # Errors
///
/// Returns the gateway's rejection (bad credentials, network) or a storage
/// error if persisting fails.
#[instrument(skip(gateway, store, password))]
pub async fn login<G: CommerceApi>(
    gateway: &G,
    store: &impl KeyValueStore,
    email: &str,
    password: &str,
) -> Result<StoredUser> {
    let response = gateway.login(email, password).await?;
    store.set(keys::AUTH_TOKEN, &response.token)?;
    store.set_json(keys::USER, &response.user)?;
    Ok(response.user)
}

/// Drop the stored credential and actor record.
///
/// The actor's shadow cart is left in place; it is keyed by user ID and
/// becomes reachable again on the next login.
///
/// # Errors
///
/// Returns a storage error if the removal cannot be persisted.
pub fn logout(store: &impl KeyValueStore) -> Result<()> {
    store.remove(keys::AUTH_TOKEN)?;
    store.remove(keys::USER)?;
    Ok(())
}

/// Resolve the current identity or fail with [`AppError::Unauthenticated`].
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`] for anonymous sessions.
pub fn require_identity(store: &impl KeyValueStore) -> Result<Identity> {
    current_identity(store).ok_or(AppError::Unauthenticated)
}
