//! Scoped access to a cart store.
//!
//! The owner of the cart (a screen, a session, a command) mounts a provider
//! with a store and hands out handles from it. Once the owner unmounts the
//! provider, further requests fail with a configuration error instead of
//! silently operating on a detached cart.

use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::error::{CartError, OUTSIDE_PROVIDER, Result};
use crate::storage::KeyValueStore;
use crate::store::CartStore;

/// Owns a [`CartStore`] for the lifetime of a mounted scope.
#[derive(Debug)]
pub struct CartProvider<S: KeyValueStore> {
    store: RwLock<Option<CartStore<S>>>,
}

impl<S: KeyValueStore> Default for CartProvider<S> {
    fn default() -> Self {
        Self::unmounted()
    }
}

impl<S: KeyValueStore> CartProvider<S> {
    /// Mount `store` and start loading the stored cart in the background.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn mount(store: CartStore<S>) -> Self {
        let _ = store.spawn_load();
        Self::new(store)
    }

    /// Mount `store` as is, without reading storage. Use this when the cart
    /// has already been loaded.
    #[must_use]
    pub fn new(store: CartStore<S>) -> Self {
        debug!(key = store.key(), "Cart provider mounted");
        Self {
            store: RwLock::new(Some(store)),
        }
    }

    /// A provider with no store. Every [`cart`](Self::cart) call fails.
    #[must_use]
    pub const fn unmounted() -> Self {
        Self {
            store: RwLock::new(None),
        }
    }

    /// Handle to the mounted cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Configuration`] if no store is mounted.
    pub fn cart(&self) -> Result<CartStore<S>> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CartError::Configuration(OUTSIDE_PROVIDER))
    }

    /// Whether a store is currently mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Detach the store. Handles already given out keep working; new
    /// requests fail. Pending writes still complete in the background.
    pub fn unmount(&self) -> Option<CartStore<S>> {
        let store = self
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if store.is_some() {
            debug!("Cart provider unmounted");
        }
        store
    }
}
