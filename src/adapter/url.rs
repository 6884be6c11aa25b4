//! Adapters backed by an HTTP GET.
//!
//! [`UrlSource`] implements the request stages for a plain URL: the cache key is the
//! resolved URL, a miss issues a GET, and textual responses are parsed as JSON.
//! Sources that need query parameters derived from the request options can either
//! supply a URL function ([`UrlSource::with_url_fn`]) or wrap a `UrlSource` in their
//! own [`RequestHooks`] implementation and delegate to [`UrlSource::fetch`].
//!
//! A missing URL is reported when a request is made rather than at construction, so a
//! `UrlSource` without a base URL is a valid starting point for sources that compute
//! the whole URL per request.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Adapter, CacheView, RequestHooks};
use crate::config::UrlAdapterConfig;
use crate::core::{PipelineError, Result};
use crate::models::RequestOptions;

type UrlFn = dyn Fn(Option<&str>, &RequestOptions) -> Option<String> + Send + Sync;

/// Request stages for a source fetched over HTTP.
pub struct UrlSource {
    url: Option<String>,
    client: reqwest::Client,
    url_fn: Option<Box<UrlFn>>,
}

/// An [`Adapter`] fetching from a URL.
pub type UrlAdapter = Adapter<UrlSource>;

impl UrlSource {
    /// Source for `url`, or with no URL configured when `None`.
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
            url_fn: None,
        }
    }

    /// Replaces the HTTP client, e.g. to set timeouts or default headers.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Computes the request URL from the base URL and the request options.
    ///
    /// Returning `None` means no URL could be built for the request.
    pub fn with_url_fn<F>(mut self, url_fn: F) -> Self
    where
        F: Fn(Option<&str>, &RequestOptions) -> Option<String> + Send + Sync + 'static,
    {
        self.url_fn = Some(Box::new(url_fn));
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Fully resolved URL for a request. Without a URL function this is the base URL.
    pub fn get_url(&self, options: &RequestOptions) -> Option<String> {
        match &self.url_fn {
            Some(url_fn) => url_fn(self.base_url(), options),
            None => self.url.clone(),
        }
    }

    /// Issues a GET for `url` and returns the body as a JSON string value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] carrying the status text for any non-success
    /// status, and [`PipelineError::Transport`] when the request itself fails.
    pub async fn fetch(&self, url: &str) -> Result<Value> {
        debug!(url = %url, "Fetching");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "Request returned error status");
            return Err(PipelineError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or(status.as_str()).to_string(),
            });
        }

        Ok(Value::String(response.text().await?))
    }
}

impl fmt::Debug for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSource")
            .field("url", &self.url)
            .field("url_fn", &self.url_fn.is_some())
            .finish()
    }
}

#[async_trait]
impl RequestHooks for UrlSource {
    fn cache_key(&self, options: &RequestOptions, _cache: &CacheView<'_>) -> Result<Option<String>> {
        Ok(self.get_url(options))
    }

    async fn perform_request(&self, options: &RequestOptions) -> Result<Value> {
        let url = self.get_url(options).ok_or_else(|| {
            PipelineError::config("Adapter must specify a URL to use for requests")
        })?;
        self.fetch(&url).await
    }

    fn normalize_response(&self, raw: Value, _options: &RequestOptions) -> Result<Value> {
        parse_text_response(raw)
    }
}

impl Adapter<UrlSource> {
    /// Builds a URL adapter from its configuration.
    pub fn from_url_config(config: UrlAdapterConfig) -> Self {
        Self::with_config(UrlSource::new(config.url), config.cache)
    }
}

/// Parses a textual response as JSON; any other value passes through unchanged.
pub fn parse_text_response(raw: Value) -> Result<Value> {
    match raw {
        Value::String(text) => Ok(serde_json::from_str(&text)?),
        other => Ok(other),
    }
}
