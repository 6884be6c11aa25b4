//! Core types shared by every module
//!
//! This module holds the crate-wide error type and the [`Result`] alias. Adapters,
//! the LRU cache, join helpers and the linked-request resolver all report failures
//! through [`PipelineError`] so that callers can match on the kind of failure
//! regardless of where in the pipeline it happened.

pub mod error;

pub use error::{PipelineError, Result};
