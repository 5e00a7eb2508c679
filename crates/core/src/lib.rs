//! Cartwheel Core - Shared domain types.
//!
//! This crate provides the common types used across all Cartwheel components:
//! - `storefront` - Client library talking to the remote commerce API
//! - `cli` - Command-line front end for cart and order management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no clocks. Everything that touches the network or the local
//! store lives in `cartwheel-storefront`; this crate stays deterministic
//! and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, cart and order values, the order
//!   status machine and its lifecycle reducer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
