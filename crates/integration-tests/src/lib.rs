//! Integration tests for GoMarket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gomarket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - `CartStore` over a `FileStore` in a temp directory,
//!   including restarts and corrupted data
//! - `cart_provider` - Provider lifecycle across mount and unmount
//!
//! Shared fixtures live here so the test files stay focused on behaviour.

use gomarket_core::{NewCartItem, Price, ProductId};

/// Build a catalog product for tests.
///
/// # Panics
///
/// Panics if `id` is blank or `cents` is negative.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn product(id: &str, title: &str, cents: i64) -> NewCartItem {
    NewCartItem {
        id: ProductId::parse(id).unwrap(),
        title: title.to_string(),
        image_url: format!("https://cdn.example.com/products/{id}.png"),
        price: Price::from_cents(cents).unwrap(),
    }
}

/// Parse a product id for tests.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn id(id: &str) -> ProductId {
    ProductId::parse(id).unwrap()
}
