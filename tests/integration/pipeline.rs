//! Integration tests for the adapter pipeline and its response cache

use anyhow::Result;
use serde_json::json;
use undercomplicate::adapter::{Adapter, DataSource};
use undercomplicate::config::AdapterConfig;
use undercomplicate::models::RequestOptions;
use undercomplicate::test_utils::{FixtureHooks, init_test_logging};

fn region(chr: &str) -> RequestOptions {
    RequestOptions::new().with("chr", chr).with("start", 1).with("end", 100)
}

fn fixture() -> FixtureHooks {
    FixtureHooks::new("chr", json!([{"variant": "10:1_A/G", "log_pvalue": 7.3}]))
}

/// Repeated requests are served from the cache
#[tokio::test]
async fn test_repeat_requests_hit_cache() -> Result<()> {
    init_test_logging(None);
    let adapter = Adapter::new(fixture());

    for _ in 0..3 {
        let records = adapter.get_data(region("10"), vec![]).await?;
        assert_eq!(records[0]["log_pvalue"], json!(7.3));
    }

    assert_eq!(adapter.hooks().fetch_count(), 1);
    assert!(adapter.is_cached("10"));
    Ok(())
}

/// The least recently used response is evicted first
#[tokio::test]
async fn test_lru_eviction() -> Result<()> {
    let adapter = Adapter::with_config(fixture(), AdapterConfig::with_cache_size(2));

    adapter.get_data(region("1"), vec![]).await?;
    adapter.get_data(region("2"), vec![]).await?;
    // Touch "1" so "2" becomes the eviction candidate
    adapter.get_data(region("1"), vec![]).await?;
    adapter.get_data(region("3"), vec![]).await?;

    assert_eq!(adapter.cache_len(), 2);
    assert!(adapter.is_cached("1"));
    assert!(!adapter.is_cached("2"));
    assert!(adapter.is_cached("3"));
    assert_eq!(adapter.hooks().fetch_count(), 3);

    adapter.get_data(region("2"), vec![]).await?;
    assert_eq!(adapter.hooks().fetch_count(), 4);
    Ok(())
}

/// Edits to a returned result never reach the cache
#[tokio::test]
async fn test_caller_mutation_does_not_leak() -> Result<()> {
    let adapter = Adapter::new(fixture());

    let mut first = adapter.get_data(region("10"), vec![]).await?;
    first[0]["log_pvalue"] = json!(0);
    if let Some(rows) = first.as_array_mut() {
        rows.push(json!({"extra": true}));
    }

    let second = adapter.get_data(region("10"), vec![]).await?;
    assert_eq!(second, json!([{"variant": "10:1_A/G", "log_pvalue": 7.3}]));
    Ok(())
}

/// Concurrent identical requests share one fetch
#[tokio::test]
async fn test_concurrent_requests_deduplicated() -> Result<()> {
    let adapter = Adapter::new(fixture());

    let (a, b, c) = tokio::join!(
        adapter.get_data(region("10"), vec![]),
        adapter.get_data(region("10"), vec![]),
        adapter.get_data(region("10"), vec![]),
    );

    assert_eq!(a?, b?);
    assert!(c.is_ok());
    assert_eq!(adapter.hooks().fetch_count(), 1);
    Ok(())
}

/// Requests without a key field bypass the cache
#[tokio::test]
async fn test_requests_without_key_are_not_cached() -> Result<()> {
    let adapter = Adapter::new(fixture());

    adapter.get_data(RequestOptions::new(), vec![]).await?;
    adapter.get_data(RequestOptions::new(), vec![]).await?;

    assert_eq!(adapter.hooks().fetch_count(), 2);
    assert_eq!(adapter.cache_len(), 0);
    Ok(())
}

/// Configuration loaded from TOML controls the cache
#[tokio::test]
async fn test_config_from_toml() -> Result<()> {
    let config = AdapterConfig::from_toml_str("cache_enabled = false")?;
    let adapter = Adapter::with_config(fixture(), config);

    adapter.get_data(region("10"), vec![]).await?;
    adapter.get_data(region("10"), vec![]).await?;

    assert_eq!(adapter.hooks().fetch_count(), 2);
    assert!(!adapter.is_cached("10"));
    Ok(())
}

/// Clearing the cache forces the next request to fetch again
#[tokio::test]
async fn test_clear_cache() -> Result<()> {
    let adapter = Adapter::new(fixture());

    adapter.get_data(region("10"), vec![]).await?;
    adapter.clear_cache();
    assert_eq!(adapter.cache_len(), 0);

    adapter.get_data(region("10"), vec![]).await?;
    assert_eq!(adapter.hooks().fetch_count(), 2);
    Ok(())
}
