//! Adapter configuration.
//!
//! Adapters are configured with plain serde structs, so a host application can embed
//! them in its own TOML or JSON settings. The library itself never reads files or
//! environment variables; everything arrives as in-memory values.
//!
//! ```toml
//! url = "https://example.org/api/v1/statistic/single/"
//! cache_enabled = true
//! cache_size = 5
//! ```
//!
//! ```rust
//! use undercomplicate::config::UrlAdapterConfig;
//!
//! # fn example() -> undercomplicate::core::Result<()> {
//! let config = UrlAdapterConfig::from_toml_str(r#"
//!     url = "https://example.org/api"
//!     cache_size = 5
//! "#)?;
//! assert_eq!(config.cache.cache_size, 5);
//! assert!(config.cache.cache_enabled);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CACHE_SIZE;
use crate::core::{PipelineError, Result};

const fn default_cache_enabled() -> bool {
    true
}

const fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

/// Caching behavior shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Whether responses are cached at all.
    ///
    /// Default: `true`
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Number of responses kept by the adapter's private cache. `0` stores nothing.
    ///
    /// Default: 3
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            cache_size: default_cache_size(),
        }
    }
}

impl AdapterConfig {
    /// Configuration with caching turned off.
    pub fn uncached() -> Self {
        Self {
            cache_enabled: false,
            ..Self::default()
        }
    }

    /// Configuration with caching on and the given capacity.
    pub fn with_cache_size(cache_size: usize) -> Self {
        Self {
            cache_size,
            ..Self::default()
        }
    }

    /// Parses the configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for malformed TOML, wrong field types, or a
    /// negative `cache_size`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        parse_toml(text)
    }
}

/// Configuration for an adapter that fetches from a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlAdapterConfig {
    /// Base URL requests are sent to.
    ///
    /// Optional so that adapters computing their URL per request can share the same
    /// configuration type; a missing URL is reported when a request is made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Caching behavior.
    #[serde(flatten)]
    pub cache: AdapterConfig,
}

impl UrlAdapterConfig {
    /// Configuration for `url` with default caching.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            cache: AdapterConfig::default(),
        }
    }

    /// Parses the configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the text does not describe a valid
    /// configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        parse_toml(text)
    }
}

fn parse_toml<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    toml::from_str(text)
        .map_err(|e| PipelineError::config(format!("Invalid adapter configuration: {e}")))
}
