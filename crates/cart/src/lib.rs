//! GoMarket Cart - persistent shopping-cart state container.
//!
//! Holds the ordered list of cart lines in memory, writes the full list to a
//! key-value store after every mutation, and notifies subscribers when the
//! contents change.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the in-memory [`Cart`] and a background writer task.
//!   Handles are cheap to clone and are passed explicitly to whatever needs
//!   the cart.
//! - [`KeyValueStore`] is the storage seam. [`MemoryStore`] and [`FileStore`]
//!   are provided.
//! - [`CartProvider`] scopes a store to a mounted owner and rejects access
//!   once it is unmounted.
//!
//! A Tokio runtime must be running when a [`CartStore`] is created.
//!
//! # Example
//!
//! ```rust,no_run
//! use gomarket_cart::{CartStore, MemoryStore};
//! use gomarket_core::{NewCartItem, Price, ProductId};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CartStore::new(MemoryStore::new());
//! store.load().await?;
//!
//! store.add_to_cart(NewCartItem {
//!     id: ProductId::parse("1")?,
//!     title: "Cadeira Rivatti".to_string(),
//!     image_url: "https://cdn.example.com/1.png".to_string(),
//!     price: "1400".parse::<Price>()?,
//! });
//! store.flush().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod provider;
pub mod storage;
pub mod store;
mod writer;

pub use error::CartError;
pub use provider::CartProvider;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartStore, DEFAULT_STORAGE_KEY, SubscriptionId};

pub use gomarket_core::{Cart, CartChange, CartItem, NewCartItem};
