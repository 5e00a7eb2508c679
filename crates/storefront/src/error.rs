//! Unified error handling for the storefront library.
//!
//! Layer errors (`GatewayError`, `StorageError`) roll up into a single
//! `AppError`; callers match on the variants they can act on and surface
//! the rest.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API operation failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local store read/write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input rejected before any network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No authenticated identity; the caller should route to login.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Referenced entity is not in the tracked state.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
