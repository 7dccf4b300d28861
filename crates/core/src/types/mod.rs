//! Core types for GoMarket.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod quantity;

pub use cart::{Cart, CartChange, CartDataError, CartItem, NewCartItem};
pub use id::{ProductId, ProductIdError};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
