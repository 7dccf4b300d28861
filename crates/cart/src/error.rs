//! Cart error type.

use thiserror::Error;

use crate::storage::StorageError;

/// Message carried by [`CartError::Configuration`] when a cart is requested
/// from a provider that has no mounted store.
pub const OUTSIDE_PROVIDER: &str = "cart used outside provider";

/// Errors surfaced by the cart store.
///
/// Mutations never return these. Persistence failures during mutations are
/// logged and the in-memory cart stays authoritative.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart accessor was used without a mounted provider.
    #[error("Configuration error: {0}")]
    Configuration(&'static str),

    /// Stored cart data could not be parsed.
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The cart could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The key-value store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
