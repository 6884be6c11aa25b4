//! Region-aware cache keys.
//!
//! Genomic requests ask for a region `chr:start-end`. Once a wide region has been
//! fetched, any narrower region inside it can be served from the same response, so
//! the cache key for a request is the key of the most recently used entry whose
//! region covers it, or a fresh `chr_start_end` key otherwise. Sources opt in by
//! storing the region as cache metadata and calling [`region_cache_key`]:
//!
//! ```rust
//! use undercomplicate::adapter::{CacheView, RegionMeta, RequestHooks, region_cache_key};
//! use undercomplicate::core::Result;
//! use undercomplicate::models::RequestOptions;
//! # use async_trait::async_trait;
//! # use serde_json::Value;
//!
//! struct Assoc;
//!
//! #[async_trait]
//! impl RequestHooks for Assoc {
//!     fn build_request_options(&self, mut options: RequestOptions, _: &[Value]) -> Result<RequestOptions> {
//!         if let Some(region) = RegionMeta::from_options(&options) {
//!             options.set_cache_meta(region);
//!         }
//!         Ok(options)
//!     }
//!
//!     fn cache_key(&self, options: &RequestOptions, cache: &CacheView<'_>) -> Result<Option<String>> {
//!         Ok(region_cache_key(options, cache))
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CacheView;
use crate::models::RequestOptions;

/// A genomic region, stored as cache metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMeta {
    /// Chromosome name
    pub chr: String,
    /// First position
    pub start: i64,
    /// Last position
    pub end: i64,
}

impl RegionMeta {
    /// Region described by a metadata value, if it has `chr`, `start` and `end`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::from_fields(|name| value.get(name))
    }

    /// Region requested by `options`, if it has `chr`, `start` and `end`.
    pub fn from_options(options: &RequestOptions) -> Option<Self> {
        Self::from_fields(|name| options.get(name))
    }

    fn from_fields<'a>(field: impl Fn(&str) -> Option<&'a Value>) -> Option<Self> {
        let chr = match field("chr")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self {
            chr,
            start: field("start")?.as_i64()?,
            end: field("end")?.as_i64()?,
        })
    }

    /// Whether this region contains all of `other`.
    pub fn covers(&self, other: &RegionMeta) -> bool {
        self.chr == other.chr && self.start <= other.start && self.end >= other.end
    }

    /// Cache key for a request with no covering entry.
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.chr, self.start, self.end)
    }
}

impl From<RegionMeta> for Value {
    fn from(region: RegionMeta) -> Self {
        serde_json::json!({
            "chr": region.chr,
            "start": region.start,
            "end": region.end,
        })
    }
}

/// Cache key for a region request: a covering cached entry's key, else `chr_start_end`.
///
/// Returns `None` when the options do not describe a region, which skips the cache.
pub fn region_cache_key(options: &RequestOptions, cache: &CacheView<'_>) -> Option<String> {
    let region = RegionMeta::from_options(options)?;
    let covering = cache.find_key(|_, meta| {
        RegionMeta::from_value(meta).is_some_and(|cached| cached.covers(&region))
    });
    Some(covering.map_or_else(|| region.key(), str::to_string))
}
