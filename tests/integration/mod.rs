//! Integration test suite for undercomplicate
//!
//! End-to-end tests that drive the public API the way a plotting front end would:
//! adapters over HTTP, linked requests across several sources, and joins over their
//! results. HTTP sources run against a local mock server, so no network is needed.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: Adapter stages, caching and mutation isolation
//! - **linked_data**: Multi-source linked requests feeding joins
//! - **url_adapter**: HTTP fetching, status errors and region-aware cache reuse

mod linked_data;
mod pipeline;
mod url_adapter;
