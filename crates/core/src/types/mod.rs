//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod lifecycle;
pub mod order;
pub mod price;
pub mod status;

pub use cart::{Cart, CartItem, QuantityChange};
pub use id::*;
pub use lifecycle::{LifecycleEffect, LifecycleEvent, reduce};
pub use order::{GRACE_SECONDS, Order, OrderLine, remaining_seconds};
pub use price::{Price, PriceError};
pub use status::{OrderStatus, TransitionError};
