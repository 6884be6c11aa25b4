//! Test utilities for undercomplicate
//!
//! Logging setup for tests, plus a fixture source that serves canned records and
//! counts how often it actually fetched them.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use undercomplicate::adapter::{Adapter, DataSource};
//! use undercomplicate::models::RequestOptions;
//! use undercomplicate::test_utils::FixtureHooks;
//!
//! # async fn example() -> undercomplicate::core::Result<()> {
//! let adapter = Adapter::new(FixtureHooks::new("chr", json!([{"id": 1}])));
//! let options = RequestOptions::new().with("chr", "10");
//! adapter.get_data(options.clone(), vec![]).await?;
//! adapter.get_data(options, vec![]).await?;
//! assert_eq!(adapter.hooks().fetch_count(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::adapter::{CacheView, RequestHooks};
use crate::core::Result;
use crate::models::{RequestOptions, deep_clone};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// This function initializes the tracing subscriber for tests, but only once
/// regardless of how many times it's called. It respects the `RUST_LOG` environment
/// variable if set, or uses the provided log level.
///
/// # Arguments
///
/// * `level` - Optional log level to use. If None, uses `RUST_LOG` environment variable
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=undercomplicate=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            // No logging if neither is provided
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Request hooks serving a fixed response, keyed by one option field.
///
/// Requests without `key_field` are not cached.
#[derive(Debug)]
pub struct FixtureHooks {
    key_field: String,
    response: Value,
    fetches: AtomicUsize,
}

impl FixtureHooks {
    /// Serve `response` for every request, keyed by `options[key_field]`.
    pub fn new(key_field: impl Into<String>, response: Value) -> Self {
        Self {
            key_field: key_field.into(),
            response,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of times `perform_request` ran.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestHooks for FixtureHooks {
    fn cache_key(&self, options: &RequestOptions, _cache: &CacheView<'_>) -> Result<Option<String>> {
        Ok(options.get(&self.key_field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    async fn perform_request(&self, _options: &RequestOptions) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(deep_clone(&self.response))
    }
}
