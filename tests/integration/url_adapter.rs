//! Integration tests for URL-backed adapters against a mock HTTP server

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use undercomplicate::adapter::{
    CacheView, DataSource, RegionMeta, RequestHooks, UrlAdapter, UrlSource, region_cache_key,
};
use undercomplicate::config::UrlAdapterConfig;
use undercomplicate::core::PipelineError;
use undercomplicate::models::RequestOptions;
use undercomplicate::test_utils::init_test_logging;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASSOC_BODY: &str = r#"[
    {"variant": "10:120_A/G", "position": 120, "log_pvalue": 9.2},
    {"variant": "10:480_C/T", "position": 480, "log_pvalue": 1.1}
]"#;

/// A successful response is parsed as JSON and cached by URL
#[tokio::test]
async fn test_fetch_parses_and_caches() -> Result<()> {
    init_test_logging(None);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assoc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ASSOC_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/assoc", server.uri());
    let adapter = UrlAdapter::from_url_config(UrlAdapterConfig::new(url.clone()));

    let first = adapter.get_data(RequestOptions::new(), vec![]).await?;
    let second = adapter.get_data(RequestOptions::new(), vec![]).await?;

    assert_eq!(first[0]["log_pvalue"], json!(9.2));
    assert_eq!(first, second);
    assert!(adapter.is_cached(&url));
    Ok(())
}

/// An error status surfaces the status text and is not cached
#[tokio::test]
async fn test_error_status_not_cached() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let adapter = UrlAdapter::new(UrlSource::new(Some(url.clone())));

    for _ in 0..2 {
        let err = adapter.get_data(RequestOptions::new(), vec![]).await.unwrap_err();
        assert!(matches!(err, PipelineError::Http { status: 404, .. }));
        assert_eq!(err.to_string(), "Not Found");
    }
    assert!(!adapter.is_cached(&url));
    Ok(())
}

/// A body that is not JSON fails normalization and is not cached
#[tokio::test]
async fn test_invalid_json_not_cached() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let adapter = UrlAdapter::new(UrlSource::new(Some(format!("{}/broken", server.uri()))));
    let err = adapter.get_data(RequestOptions::new(), vec![]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Json { .. }));
    assert_eq!(adapter.cache_len(), 0);
    Ok(())
}

/// A URL function turns request options into query parameters
#[tokio::test]
async fn test_url_fn_query_parameters() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assoc"))
        .and(query_param("chr", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ASSOC_BODY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assoc"))
        .and(query_param("chr", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let source = UrlSource::new(Some(format!("{}/assoc", server.uri()))).with_url_fn(
        |base, options| Some(format!("{}?chr={}", base?, options.get_str("chr")?)),
    );
    let adapter = UrlAdapter::new(source);

    let chr10 = adapter.get_data(RequestOptions::new().with("chr", "10"), vec![]).await?;
    let chr11 = adapter.get_data(RequestOptions::new().with("chr", "11"), vec![]).await?;
    adapter.get_data(RequestOptions::new().with("chr", "10"), vec![]).await?;

    assert_eq!(chr10.as_array().map(Vec::len), Some(2));
    assert_eq!(chr11, json!([]));
    assert_eq!(adapter.cache_len(), 2);
    Ok(())
}

/// Region source that reuses a cached wider region and trims records to the request
struct RegionSource {
    inner: UrlSource,
}

#[async_trait]
impl RequestHooks for RegionSource {
    fn build_request_options(
        &self,
        mut options: RequestOptions,
        _dependent_data: &[Value],
    ) -> undercomplicate::core::Result<RequestOptions> {
        if let Some(region) = RegionMeta::from_options(&options) {
            options.set_cache_meta(region);
        }
        Ok(options)
    }

    fn cache_key(
        &self,
        options: &RequestOptions,
        cache: &CacheView<'_>,
    ) -> undercomplicate::core::Result<Option<String>> {
        Ok(region_cache_key(options, cache))
    }

    async fn perform_request(&self, options: &RequestOptions) -> undercomplicate::core::Result<Value> {
        let region = RegionMeta::from_options(options)
            .ok_or_else(|| PipelineError::config("Request has no region"))?;
        let base = self.inner.base_url().unwrap_or_default();
        let url = format!("{base}?chr={}&start={}&end={}", region.chr, region.start, region.end);
        self.inner.fetch(&url).await
    }

    fn normalize_response(
        &self,
        raw: Value,
        _options: &RequestOptions,
    ) -> undercomplicate::core::Result<Value> {
        undercomplicate::adapter::parse_text_response(raw)
    }

    fn annotate_records(
        &self,
        records: Value,
        options: &RequestOptions,
    ) -> undercomplicate::core::Result<Value> {
        let Some(region) = RegionMeta::from_options(options) else {
            return Ok(records);
        };
        let within = |record: &Value| {
            record["position"]
                .as_i64()
                .is_some_and(|pos| pos >= region.start && pos <= region.end)
        };
        Ok(Value::Array(
            records.as_array().into_iter().flatten().filter(|r| within(r)).cloned().collect(),
        ))
    }
}

/// A narrower region is answered from the cached wider region
#[tokio::test]
async fn test_region_superset_reuse() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assoc"))
        .and(query_param("start", "1"))
        .and(query_param("end", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ASSOC_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = undercomplicate::adapter::Adapter::new(RegionSource {
        inner: UrlSource::new(Some(format!("{}/assoc", server.uri()))),
    });

    let wide = RequestOptions::new().with("chr", "10").with("start", 1).with("end", 1000);
    let narrow = RequestOptions::new().with("chr", "10").with("start", 100).with("end", 200);

    let all = adapter.get_data(wide, vec![]).await?;
    let some = adapter.get_data(narrow, vec![]).await?;

    assert_eq!(all.as_array().map(Vec::len), Some(2));
    assert_eq!(some, json!([{"variant": "10:120_A/G", "position": 120, "log_pvalue": 9.2}]));
    assert!(adapter.is_cached("10_1_1000"));
    assert_eq!(adapter.cache_len(), 1);
    Ok(())
}
