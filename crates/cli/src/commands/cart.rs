//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the stored cart
//! gm-cart show
//!
//! # Add a product (or one more unit of it)
//! gm-cart add --id 1 --title "Cadeira Rivatti" --image-url https://cdn/1.png --price 1400
//!
//! # Change quantities
//! gm-cart increment 1
//! gm-cart decrement 1
//! ```

use std::fmt::Write as _;

use gomarket_cart::{Cart, CartError, CartStore, FileStore, StorageError};
use gomarket_core::{NewCartItem, ProductId};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CliConfig;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The data directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The stored cart could not be read.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

/// Open the file-backed cart and load its stored contents.
///
/// A malformed stored cart is logged and replaced by an empty one.
async fn open(config: &CliConfig) -> Result<CartStore<FileStore>, CommandError> {
    let storage = FileStore::open(&config.data_dir).await?;
    let store = CartStore::with_key(storage, config.cart_key.clone());

    match store.load().await {
        Ok(()) => Ok(store),
        Err(CartError::Deserialization(e)) => {
            warn!(error = %e, "Ignoring malformed stored cart");
            Ok(store)
        }
        Err(e) => Err(e.into()),
    }
}

/// Load the cart and return it unchanged.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened or read.
pub async fn show(config: &CliConfig) -> Result<Cart, CommandError> {
    Ok(open(config).await?.items())
}

/// Add a product to the stored cart.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened or read.
pub async fn add(config: &CliConfig, item: NewCartItem) -> Result<Cart, CommandError> {
    let store = open(config).await?;
    let id = item.id.clone();
    let change = store.add_to_cart(item);
    info!(product_id = %id, ?change, "Added to cart");
    finish(&store).await
}

/// Add one unit of a product already in the stored cart.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened or read.
pub async fn increment(config: &CliConfig, id: &ProductId) -> Result<Cart, CommandError> {
    let store = open(config).await?;
    let change = store.increment(id);
    if !change.is_changed() {
        warn!(product_id = %id, "Product not in cart");
    }
    finish(&store).await
}

/// Remove one unit of a product from the stored cart.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened or read.
pub async fn decrement(config: &CliConfig, id: &ProductId) -> Result<Cart, CommandError> {
    let store = open(config).await?;
    let change = store.decrement(id);
    if change.is_changed() {
        info!(product_id = %id, ?change, "Decremented");
    } else {
        warn!(product_id = %id, "Product not in cart");
    }
    finish(&store).await
}

/// Wait for the write to land before the process exits.
async fn finish(store: &CartStore<FileStore>) -> Result<Cart, CommandError> {
    store.flush().await;
    Ok(store.items())
}

/// Render the cart as a plain-text table.
#[must_use]
pub fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in cart {
        let _ = writeln!(
            out,
            "{:<12} {:<32} {:>4} x {:>10} = {:>10}",
            line.id.as_str(),
            line.title,
            line.quantity,
            line.price.to_string(),
            line.line_total().to_string(),
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), subtotal {}",
        cart.total_quantity(),
        cart.subtotal()
    );
    out
}

/// Print the cart to stdout.
#[allow(clippy::print_stdout)]
pub fn print(cart: &Cart) {
    print!("{}", render(cart));
}
