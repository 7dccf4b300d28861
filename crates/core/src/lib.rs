//! GoMarket Core - Shared cart types library.
//!
//! This crate provides the domain types used across all GoMarket components:
//! - `cart` - Cart state container with persistence and observers
//! - `cli` - Command-line tool for inspecting and editing a stored cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart logic - no I/O, no
//! storage access, no async runtime. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, and quantities,
//!   plus the [`Cart`] line-item sequence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
