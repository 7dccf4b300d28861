//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GOMARKET_DATA_DIR` - Directory holding the stored cart (default: `.gomarket`)
//! - `GOMARKET_CART_KEY` - Storage key for the cart (default: `@GoBarber-cart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `RUST_LOG` - Log filter (default: `gomarket_cart=info,gomarket_cli=info`)

use std::path::PathBuf;

use gomarket_cart::DEFAULT_STORAGE_KEY;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = ".gomarket";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory for the file-backed key-value store
    pub data_dir: PathBuf,
    /// Storage key the cart is persisted under
    pub cart_key: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(
            non_blank(lookup("GOMARKET_DATA_DIR")).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let cart_key = match lookup("GOMARKET_CART_KEY") {
            None => DEFAULT_STORAGE_KEY.to_string(),
            Some(key) if key.trim().is_empty() => {
                return Err(ConfigError::InvalidEnvVar(
                    "GOMARKET_CART_KEY".to_string(),
                    "must not be blank".to_string(),
                ));
            }
            Some(key) => key,
        };

        Ok(Self {
            data_dir,
            cart_key,
            sentry_dsn: non_blank(lookup("SENTRY_DSN")),
            sentry_environment: non_blank(lookup("SENTRY_ENVIRONMENT")),
        })
    }
}

/// Treat empty values the same as unset ones.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".gomarket"));
        assert_eq!(config.cart_key, "@GoBarber-cart");
        assert!(config.sentry_dsn.is_none());
        assert!(config.sentry_environment.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GOMARKET_DATA_DIR", "/var/lib/gomarket"),
            ("GOMARKET_CART_KEY", "cart-v2"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/gomarket"));
        assert_eq!(config.cart_key, "cart-v2");
        assert_eq!(
            config.sentry_dsn.as_deref(),
            Some("https://key@sentry.example.com/1")
        );
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config_from(&[("GOMARKET_DATA_DIR", ""), ("SENTRY_DSN", "  ")]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".gomarket"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_blank_cart_key_rejected() {
        let err = config_from(&[("GOMARKET_CART_KEY", " ")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "GOMARKET_CART_KEY"));
    }
}
