//! Cartwheel Storefront library.
//!
//! The client-side core of the storefront: a typed gateway to the remote
//! commerce API, a key/value storage abstraction standing in for the
//! browser's local store, the cart reconciliation manager, and the order
//! lifecycle tracker.
//!
//! Nothing in here renders anything; callers (the CLI, tests) own the
//! presentation. Every failure path degrades to local state or a reportable
//! error rather than aborting.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orders;
pub mod session;
pub mod storage;

pub use error::{AppError, Result};
