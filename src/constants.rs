//! Global constants used throughout the undercomplicate codebase.
//!
//! Defaults and reserved option keys live here so that the adapter, configuration
//! and resolver modules agree on them.

/// Default number of entries kept by an adapter's cache.
pub const DEFAULT_CACHE_SIZE: usize = 3;

/// Request option key naming the alias a linked request invoked a source under.
pub const PROVIDER_NAME_KEY: &str = "_provider_name";

/// Request option key carrying the metadata stored next to a cache entry.
pub const CACHE_META_KEY: &str = "_cache_meta";
