//! undercomplicate - data retrieval for genomic association plots
//!
//! Fetches records from several remote sources, caches the responses, and combines
//! them into one dataset for a consumer to render.
//!
//! # Architecture Overview
//!
//! Data flows through three layers:
//! - **Adapters** fetch one source's records through a fixed pipeline of overridable
//!   stages (build options, cache key, request, normalize, annotate, post-process)
//! - **Linked requests** run several named adapters in dependency order, passing each
//!   one the results of the sources it depends on
//! - **Joins** merge the record lists of two sources on matching key fields
//!
//! ## Key Features
//!
//! - **Request deduplication**: concurrent identical requests share one fetch
//! - **Failure-safe caching**: failed requests never stay in the cache
//! - **Mutation isolation**: callers always receive their own copy of cached data
//! - **Region reuse**: a cached wide region can answer requests for narrower ones
//!
//! # Core Modules
//!
//! ## Core Functionality
//! - [`adapter`] - Adapter pipeline, request hooks and built-in sources
//! - [`cache`] - Bounded LRU cache with per-entry metadata
//! - [`resolver`] - Declaration parsing, dependency ordering and linked requests
//! - [`joins`] - Left, inner and full outer record joins
//!
//! ## Supporting Modules
//! - [`config`] - Adapter cache configuration
//! - [`constants`] - Default sizes and reserved option keys
//! - [`core`] - Error type and result alias
//! - [`models`] - Request options and record helpers
//! - [`transforms`] - Field renaming and projection for post-processing
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use undercomplicate::adapter::{FnSource, UrlAdapter, UrlSource};
//! use undercomplicate::joins::left_match;
//! use undercomplicate::models::RequestOptions;
//! use undercomplicate::resolver::{SourceMap, get_linked_data};
//!
//! # async fn example() -> undercomplicate::core::Result<()> {
//! let mut sources = SourceMap::new();
//! sources.insert(
//!     "assoc".into(),
//!     Arc::new(UrlAdapter::new(UrlSource::new(Some("https://example.org/assoc".into())))),
//! );
//! sources.insert(
//!     "catalog".into(),
//!     Arc::new(UrlAdapter::new(UrlSource::new(Some("https://example.org/catalog".into())))),
//! );
//! sources.insert(
//!     "combined".into(),
//!     Arc::new(FnSource::new(|_, deps| {
//!         let assoc = deps[0].as_array().cloned().unwrap_or_default();
//!         let catalog = deps[1].as_array().cloned().unwrap_or_default();
//!         Ok(left_match(&assoc, &catalog, "variant", "variant")?.into())
//!     })),
//! );
//!
//! let options = RequestOptions::new().with("chr", "10").with("start", 1).with("end", 5000);
//! let _records =
//!     get_linked_data(&options, &sources, &["assoc", "catalog", "combined(assoc, catalog)"], true)
//!         .await?;
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod adapter;
pub mod cache;
pub mod joins;
pub mod resolver;

// Supporting modules
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod transforms;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
