//! Shared data models for adapter requests
//!
//! Records travel through the pipeline as [`serde_json::Value`]: a record is an
//! object, a collection of records is an array, and adapters that return something
//! else (a plain string, a number) pass it through untouched. This module adds the
//! request option bag every adapter receives and the copy helper that protects cached
//! data from in-place edits.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CACHE_META_KEY, PROVIDER_NAME_KEY};

/// One row of domain data.
pub type Record = Map<String, Value>;

/// Options for a single request.
///
/// Each adapter call owns its options: the resolver hands every node of a linked
/// request a fresh copy of the shared options, and adapters derive per-request values
/// into their own copy, so sibling requests never observe each other's changes.
///
/// Two keys are reserved:
/// - `_provider_name`: the alias a linked request invoked the source under
/// - `_cache_meta`: metadata stored next to the cache entry for this request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestOptions(Map<String, Value>);

impl RequestOptions {
    /// Creates an empty option bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the option stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes the option stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns the option under `key` as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the option under `key` as an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Alias the resolver invoked this request under, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.get_str(PROVIDER_NAME_KEY)
    }

    /// Metadata to store with the cache entry, `Null` when none was set.
    pub fn cache_meta(&self) -> Value {
        self.0.get(CACHE_META_KEY).cloned().unwrap_or(Value::Null)
    }

    /// Sets the metadata stored with the cache entry for this request.
    pub fn set_cache_meta(&mut self, meta: impl Into<Value>) {
        self.0.insert(CACHE_META_KEY.to_string(), meta.into());
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RequestOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RequestOptions> for Value {
    fn from(options: RequestOptions) -> Self {
        Value::Object(options.0)
    }
}

/// Structural copy of `value`.
///
/// Objects and arrays are copied all the way down, so the result shares nothing with
/// `value`. Everything read out of an adapter cache goes through here before any
/// stage that may edit records in place.
pub fn deep_clone(value: &Value) -> Value {
    value.clone()
}
