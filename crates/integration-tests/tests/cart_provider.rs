//! Integration tests for the cart provider lifecycle.
//!
//! Run with: cargo test -p gomarket-integration-tests

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use gomarket_cart::{Cart, CartError, CartProvider, CartStore, FileStore};
use gomarket_integration_tests::{id, product};

/// Load the stored cart, then mount it.
async fn mount_loaded(dir: &std::path::Path) -> CartProvider<FileStore> {
    let storage = FileStore::open(dir).await.unwrap();
    let store = CartStore::new(storage);
    store.load().await.unwrap();
    CartProvider::new(store)
}

#[tokio::test]
async fn test_session_lifecycle() {
    let tmp = tempfile::tempdir().unwrap();

    // First session: a screen adds products and then goes away.
    let provider = mount_loaded(tmp.path()).await;
    let cart = provider.cart().unwrap();
    cart.add_to_cart(product("1", "Cadeira", 10_000));
    cart.add_to_cart(product("1", "Cadeira", 10_000));
    cart.flush().await;

    let store = provider.unmount().unwrap();
    assert!(matches!(
        provider.cart(),
        Err(CartError::Configuration(_))
    ));
    store.flush().await;
    drop(store);
    drop(cart);

    // Second session sees the same cart.
    let provider = mount_loaded(tmp.path()).await;
    let cart = provider.cart().unwrap();
    assert_eq!(cart.items().total_quantity(), 2);
}

#[tokio::test]
async fn test_subscriber_tracks_every_change() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = mount_loaded(tmp.path()).await;
    let cart = provider.cart().unwrap();

    let history: Arc<Mutex<Vec<Cart>>> = Arc::default();
    let sink = Arc::clone(&history);
    let sub = cart.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));

    cart.add_to_cart(product("a", "A", 100));
    cart.add_to_cart(product("b", "B", 250));
    cart.increment(&id("a"));
    cart.decrement(&id("b"));

    let history = history.lock().unwrap().clone();
    let totals: Vec<u64> = history.iter().map(Cart::total_quantity).collect();
    assert_eq!(totals, vec![1, 2, 3, 2]);
    assert_eq!(history.last(), Some(&cart.items()));

    assert!(cart.unsubscribe(sub));
}
