//! Sources that compute their result instead of fetching it.
//!
//! These sit in a linked request next to network adapters: a join step is usually an
//! [`FnSource`] that combines the results of its dependencies.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::DataSource;
use crate::core::Result;
use crate::models::{RequestOptions, deep_clone};

/// Always returns (a copy of) the same data.
#[derive(Debug, Clone)]
pub struct StaticSource {
    data: Value,
}

impl StaticSource {
    /// Source serving `data`.
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn get_data(&self, _options: RequestOptions, _dependent_data: Vec<Value>) -> Result<Value> {
        Ok(deep_clone(&self.data))
    }
}

type ComputeFn = dyn Fn(&RequestOptions, Vec<Value>) -> Result<Value> + Send + Sync;

/// Computes its result from the request options and dependency results.
pub struct FnSource {
    compute: Box<ComputeFn>,
}

impl FnSource {
    /// Source backed by `compute`.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&RequestOptions, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            compute: Box::new(compute),
        }
    }
}

impl fmt::Debug for FnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl DataSource for FnSource {
    async fn get_data(&self, options: RequestOptions, dependent_data: Vec<Value>) -> Result<Value> {
        (self.compute)(&options, dependent_data)
    }
}
