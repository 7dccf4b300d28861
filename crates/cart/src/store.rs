//! The cart state container.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use gomarket_core::{Cart, CartChange, NewCartItem, ProductId};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CartError, Result};
use crate::storage::KeyValueStore;
use crate::writer::PersistWriter;

/// Storage key the mobile app has always used for the cart.
pub const DEFAULT_STORAGE_KEY: &str = "@GoBarber-cart";

type Observer = Arc<dyn Fn(&Cart) + Send + Sync>;

/// Identifies a registered observer so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shopping-cart state backed by a key-value store.
///
/// This struct is cheaply cloneable via `Arc`; every clone operates on the
/// same cart. Mutations that change the cart apply to memory immediately,
/// queue a write of the whole cart, and then notify observers. A mutation on
/// an unknown id touches nothing. Callers never wait on storage.
pub struct CartStore<S: KeyValueStore> {
    inner: Arc<CartStoreInner<S>>,
}

struct CartStoreInner<S> {
    storage: Arc<S>,
    key: String,
    state: Mutex<CartState>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
    outbox: Mutex<Outbox>,
    /// Held by the one thread currently calling observers.
    delivering: Mutex<()>,
    writer: PersistWriter,
}

/// Newest cart waiting for observers.
#[derive(Default)]
struct Outbox {
    version: u64,
    cart: Option<Cart>,
}

#[derive(Default)]
struct CartState {
    cart: Cart,
    /// Bumped whenever the cart contents change. A load that started before
    /// the latest change must not overwrite it.
    version: u64,
}

impl<S: KeyValueStore> Clone for CartStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .field("cart", &self.inner.lock_state().cart)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create an empty cart persisted under [`DEFAULT_STORAGE_KEY`].
    ///
    /// Nothing is read from storage until [`load`](Self::load) or
    /// [`spawn_load`](Self::spawn_load) is called.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Create an empty cart persisted under `key`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        let storage = Arc::new(storage);
        let key = key.into();
        let writer = PersistWriter::spawn(Arc::clone(&storage), key.clone());

        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                key,
                state: Mutex::new(CartState::default()),
                observers: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(0),
                outbox: Mutex::new(Outbox::default()),
                delivering: Mutex::new(()),
                writer,
            }),
        }
    }

    /// Storage key this cart is persisted under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn items(&self) -> Cart {
        self.inner.lock_state().cart.clone()
    }

    /// Add a product, or one more unit of it if it is already in the cart.
    pub fn add_to_cart(&self, item: NewCartItem) -> CartChange {
        let id = item.id.clone();
        let change = self.mutate(|cart| cart.add(item));
        debug!(product_id = %id, ?change, "add_to_cart");
        change
    }

    /// Add one unit of a product already in the cart. Unknown ids are ignored.
    pub fn increment(&self, id: &ProductId) -> CartChange {
        let change = self.mutate(|cart| cart.increment(id));
        debug!(product_id = %id, ?change, "increment");
        change
    }

    /// Remove one unit of a product, dropping the line at zero. Unknown ids
    /// are ignored.
    pub fn decrement(&self, id: &ProductId) -> CartChange {
        let change = self.mutate(|cart| cart.decrement(id));
        debug!(product_id = %id, ?change, "decrement");
        change
    }

    /// Replace the cart with the value held in storage.
    ///
    /// A missing or blank value leaves the cart empty. If a mutation happens
    /// while the read is in flight, the loaded value is discarded.
    ///
    /// # Errors
    ///
    /// - [`CartError::Storage`] if the read fails; the cart is left as is.
    /// - [`CartError::Deserialization`] if the stored value is malformed; the
    ///   cart is reset to empty.
    pub async fn load(&self) -> Result<()> {
        let started_at = self.inner.lock_state().version;
        self.load_since(started_at).await
    }

    /// Load the stored cart in the background.
    ///
    /// Failures are logged by [`load`](Self::load). Observers see the loaded
    /// cart once it arrives. Any change made after this call wins over the
    /// loaded value, even if the task has not started yet. No-op mutations do
    /// not count as changes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn_load(&self) -> JoinHandle<()> {
        let store = self.clone();
        let started_at = self.inner.lock_state().version;
        tokio::spawn(async move {
            let _ = store.load_since(started_at).await;
        })
    }

    #[instrument(skip(self), fields(key = %self.inner.key))]
    async fn load_since(&self, started_at: u64) -> Result<()> {
        let raw = match self.inner.storage.get(&self.inner.key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart");
                return Err(e.into());
            }
        };

        let Some(json) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            debug!("No stored cart");
            return Ok(());
        };

        match serde_json::from_str::<Cart>(json) {
            Ok(cart) => {
                let lines = cart.len();
                if self.replace(cart, started_at) {
                    info!(lines, "Loaded stored cart");
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Stored cart is malformed, starting with an empty cart");
                self.replace(Cart::new(), started_at);
                Err(CartError::Deserialization(e))
            }
        }
    }

    /// Wait until every write queued so far has been attempted.
    ///
    /// Write failures are logged, not returned.
    pub async fn flush(&self) {
        self.inner.writer.flush().await;
    }

    /// Register `observer` to be called with the new cart after every
    /// mutation that changes it and after a successful load.
    ///
    /// Observers run on the mutating thread after the cart lock is released,
    /// so they may read and mutate the store but should not block. Observers
    /// see versions in order: when threads race, one of them delivers the
    /// newest cart and older snapshots are skipped.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Cart) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner
            .lock_observers()
            .push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.inner.lock_observers();
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    /// Apply `op`. If the cart changed, queue it for persistence and notify.
    fn mutate(&self, op: impl FnOnce(&mut Cart) -> CartChange) -> CartChange {
        let (change, version, cart) = {
            let mut state = self.inner.lock_state();
            let change = op(&mut state.cart);
            if !change.is_changed() {
                return change;
            }
            state.version += 1;

            // Published under the lock so queued writes follow mutation order.
            match serde_json::to_string(&state.cart) {
                Ok(payload) => self.inner.writer.publish(payload),
                Err(e) => {
                    let err = CartError::Serialization(e);
                    error!(error = %err, "Failed to queue cart write");
                }
            }

            (change, state.version, state.cart.clone())
        };

        self.notify(cart, version);
        change
    }

    /// Swap in a loaded cart unless the cart changed since `started_at`.
    fn replace(&self, cart: Cart, started_at: u64) -> bool {
        let (version, snapshot) = {
            let mut state = self.inner.lock_state();
            if state.version != started_at {
                warn!("Cart changed while loading, keeping in-memory cart");
                return false;
            }
            state.cart = cart;
            state.version += 1;
            (state.version, state.cart.clone())
        };
        self.notify(snapshot, version);
        true
    }

    /// Queue `cart` at `version` for observers and deliver it unless
    /// another thread is already delivering.
    fn notify(&self, cart: Cart, version: u64) {
        {
            let mut outbox = self.inner.lock_outbox();
            if version <= outbox.version {
                debug!(version, newest = outbox.version, "Skipping stale cart notification");
                return;
            }
            outbox.version = version;
            outbox.cart = Some(cart);
        }

        loop {
            let guard = match self.inner.delivering.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                // The current deliverer picks up the queued cart.
                Err(TryLockError::WouldBlock) => return,
            };

            loop {
                let next = self.inner.lock_outbox().cart.take();
                let Some(cart) = next else { break };
                let observers: Vec<Observer> = self
                    .inner
                    .lock_observers()
                    .iter()
                    .map(|(_, observer)| Arc::clone(observer))
                    .collect();
                for observer in observers {
                    observer(&cart);
                }
            }
            drop(guard);

            // A cart queued between the last take and the unlock is ours.
            if self.inner.lock_outbox().cart.is_none() {
                return;
            }
        }
    }
}

impl<S> CartStoreInner<S> {
    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
