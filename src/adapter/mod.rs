//! Adapters: fetch, normalize, annotate and post-process records, with caching.
//!
//! An adapter is the unit a consumer asks for data. It runs a fixed pipeline:
//!
//! ```text
//! build_request_options ─► cache_key ─► (cache hit) ───────────────────────────┐
//!                                    └► perform_request ─► normalize_response ─┤
//!                                                                              ▼
//!                    post_process_response ◄─ annotate_records ◄─ deep_clone(result)
//! ```
//!
//! The stages are the methods of [`RequestHooks`]; a concrete data source implements
//! only the ones it needs and wraps itself in an [`Adapter`], which owns the cache
//! and drives the stages. Anything that can answer [`DataSource::get_data`] can take
//! part in a linked request, whether it performs I/O ([`Adapter`]) or only computes
//! from its dependencies ([`FnSource`], [`StaticSource`]).
//!
//! # Caching
//!
//! The cache holds in-flight requests, not finished results. Two calls with the same
//! key made before the first completes share one underlying request. A request that
//! fails removes its own cache entry before any waiter sees the error, so the next
//! identical call starts over instead of replaying the failure. Results read from the
//! cache are deep-copied before `annotate_records` runs, so edits made by later stages
//! never leak back into the cache.
//!
//! A cache key of `None` or `""` means "do not cache this call". Keys are strings, so
//! an empty string is never a usable key.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use serde_json::{Value, json};
//! use undercomplicate::adapter::{Adapter, CacheView, DataSource, RequestHooks};
//! use undercomplicate::core::Result;
//! use undercomplicate::models::RequestOptions;
//!
//! struct Doubler;
//!
//! #[async_trait]
//! impl RequestHooks for Doubler {
//!     fn cache_key(&self, options: &RequestOptions, _: &CacheView<'_>) -> Result<Option<String>> {
//!         Ok(options.get_i64("n").map(|n| n.to_string()))
//!     }
//!
//!     async fn perform_request(&self, options: &RequestOptions) -> Result<Value> {
//!         Ok(json!(options.get_i64("n").unwrap_or(0) * 2))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let adapter = Adapter::new(Doubler);
//! let value = adapter.get_data(RequestOptions::new().with("n", 21), vec![]).await?;
//! assert_eq!(value, json!(42));
//! assert!(adapter.is_cached("21"));
//! # Ok(())
//! # }
//! ```

mod computed;
pub mod region;
pub mod url;

pub use computed::{FnSource, StaticSource};
pub use region::{RegionMeta, region_cache_key};
pub use url::{UrlAdapter, UrlSource, parse_text_response};

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::cache::LruCache;
use crate::config::AdapterConfig;
use crate::core::{PipelineError, Result};
use crate::models::{RequestOptions, deep_clone};

/// Anything that can serve data to a consumer or to a linked request.
///
/// `dependent_data` holds the resolved results of the source's declared dependencies,
/// in declaration order. Sources that have no dependencies receive an empty vector.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches (or computes) the data for one request.
    async fn get_data(&self, options: RequestOptions, dependent_data: Vec<Value>) -> Result<Value>;
}

/// The overridable stages of the adapter pipeline.
///
/// Every stage has a pass-through default except [`RequestHooks::cache_key`] and
/// [`RequestHooks::perform_request`], which report [`PipelineError::NotImplemented`].
/// `cache_key` is only consulted while caching is enabled, so uncached sources can
/// leave it alone.
#[async_trait]
pub trait RequestHooks: Send + Sync + 'static {
    /// Derives the effective options for this request from the caller's options and
    /// the results of upstream dependencies.
    fn build_request_options(
        &self,
        options: RequestOptions,
        dependent_data: &[Value],
    ) -> Result<RequestOptions> {
        let _ = dependent_data;
        Ok(options)
    }

    /// Cache key for the request. `None` or an empty string skips the cache.
    ///
    /// `cache` gives read access to the adapter's current entries, so a source can
    /// return the key of an existing entry whose metadata already covers the request.
    fn cache_key(&self, options: &RequestOptions, cache: &CacheView<'_>) -> Result<Option<String>> {
        let _ = (options, cache);
        Err(PipelineError::NotImplemented { hook: "cache_key" })
    }

    /// Performs the I/O for a cache miss and returns the raw response.
    async fn perform_request(&self, options: &RequestOptions) -> Result<Value> {
        let _ = options;
        Err(PipelineError::NotImplemented {
            hook: "perform_request",
        })
    }

    /// Converts a raw response into records.
    fn normalize_response(&self, raw: Value, options: &RequestOptions) -> Result<Value> {
        let _ = options;
        Ok(raw)
    }

    /// Adds derived fields to a private copy of the records.
    fn annotate_records(&self, records: Value, options: &RequestOptions) -> Result<Value> {
        let _ = options;
        Ok(records)
    }

    /// Final reshaping of the records, e.g. renaming or namespacing fields.
    fn post_process_response(&self, records: Value, options: &RequestOptions) -> Result<Value> {
        let _ = options;
        Ok(records)
    }
}

/// A normalized response shared by every caller waiting on the same request.
type SharedResponse = Shared<BoxFuture<'static, Result<Arc<Value>>>>;

struct CacheEntry {
    id: u64,
    response: SharedResponse,
}

type ResponseCache = LruCache<String, CacheEntry, Value>;

struct CacheState {
    entries: ResponseCache,
    next_id: u64,
}

/// Read-only view of an adapter's cache, handed to [`RequestHooks::cache_key`].
pub struct CacheView<'a> {
    entries: &'a ResponseCache,
}

impl<'a> CacheView<'a> {
    /// Whether an entry exists under `key`.
    pub fn has(&self, key: &str) -> bool {
        self.entries.has(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the most recently used entry whose key and metadata satisfy `predicate`.
    pub fn find_key<P>(&self, mut predicate: P) -> Option<&'a str>
    where
        P: FnMut(&str, &Value) -> bool,
    {
        self.entries
            .find(|node| predicate(&node.key, &node.metadata))
            .map(|node| node.key.as_str())
    }
}

/// Drives the [`RequestHooks`] pipeline and owns a private response cache.
///
/// Caches are never shared between adapters. The adapter is cheap to call
/// concurrently: the cache lock is only held while looking up or inserting an entry,
/// never across an await.
pub struct Adapter<H> {
    hooks: Arc<H>,
    config: AdapterConfig,
    cache: Arc<Mutex<CacheState>>,
}

impl<H: RequestHooks> Adapter<H> {
    /// Wraps `hooks` with the default configuration (caching on, 3 entries).
    pub fn new(hooks: H) -> Self {
        Self::with_config(hooks, AdapterConfig::default())
    }

    /// Wraps `hooks` with an explicit configuration.
    pub fn with_config(hooks: H, config: AdapterConfig) -> Self {
        Self {
            hooks: Arc::new(hooks),
            config,
            cache: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(config.cache_size),
                next_id: 0,
            })),
        }
    }

    /// The pipeline stages this adapter runs.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The adapter's configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Whether a response is cached (or in flight) under `key`.
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.lock().entries.has(key)
    }

    /// Number of cached responses.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    /// Drops every cached response.
    pub fn clear_cache(&self) {
        self.cache.lock().entries.clear();
    }

    /// Returns the shared response for `options`, from the cache when possible.
    fn response_for(&self, options: &RequestOptions) -> Result<SharedResponse> {
        if !self.config.cache_enabled {
            return Ok(self.start_request(options, None));
        }

        let mut state = self.cache.lock();
        let key = self.hooks.cache_key(
            options,
            &CacheView {
                entries: &state.entries,
            },
        )?;
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            trace!("No cache key for request, bypassing cache");
            return Ok(self.start_request(options, None));
        };

        if let Some(entry) = state.entries.get(key.as_str()) {
            debug!(key = %key, "Cache hit");
            return Ok(entry.response.clone());
        }

        debug!(key = %key, "Cache miss");
        let id = state.next_id;
        state.next_id += 1;
        let response = self.start_request(options, Some((key.clone(), id)));
        state.entries.add(
            key,
            CacheEntry {
                id,
                response: response.clone(),
            },
            options.cache_meta(),
        );
        Ok(response)
    }

    /// Builds the shared `perform_request` → `normalize_response` future.
    ///
    /// When `slot` is set, a failure removes the cache entry with that key and id.
    fn start_request(&self, options: &RequestOptions, slot: Option<(String, u64)>) -> SharedResponse {
        let hooks = Arc::clone(&self.hooks);
        let cache = Arc::clone(&self.cache);
        let options = options.clone();

        async move {
            let result = match hooks.perform_request(&options).await {
                Ok(raw) => hooks.normalize_response(raw, &options).map(Arc::new),
                Err(err) => Err(err),
            };

            if let Err(err) = &result
                && let Some((key, id)) = slot
            {
                let mut state = cache.lock();
                if state.entries.peek(key.as_str()).is_some_and(|entry| entry.id == id) {
                    state.entries.remove(key.as_str());
                    warn!(key = %key, error = %err, "Request failed, evicted from cache");
                }
            }
            result
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl<H: RequestHooks> DataSource for Adapter<H> {
    async fn get_data(&self, options: RequestOptions, dependent_data: Vec<Value>) -> Result<Value> {
        let options = self.hooks.build_request_options(options, &dependent_data)?;
        let response = self.response_for(&options)?;
        let shared = response.await?;

        let records = deep_clone(&shared);
        let records = self.hooks.annotate_records(records, &options)?;
        self.hooks.post_process_response(records, &options)
    }
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn get_data(&self, options: RequestOptions, dependent_data: Vec<Value>) -> Result<Value> {
        (**self).get_data(options, dependent_data).await
    }
}
