//! Integration tests for linked requests that combine several sources

use std::sync::Arc;

use anyhow::Result;
use serde_json::{Value, json};
use undercomplicate::adapter::{Adapter, DataSource, FnSource};
use undercomplicate::core::PipelineError;
use undercomplicate::joins::{full_outer_match, inner_match, left_match};
use undercomplicate::models::RequestOptions;
use undercomplicate::resolver::{LinkedRequest, SourceMap, get_linked_data};
use undercomplicate::test_utils::{FixtureHooks, init_test_logging};
use undercomplicate::transforms::prefix_namespace;

fn assoc_records() -> Value {
    json!([
        {"variant": "10:100_A/G", "log_pvalue": 8.1},
        {"variant": "10:250_C/T", "log_pvalue": 2.4},
    ])
}

fn catalog_records() -> Value {
    json!([
        {"variant": "10:100_A/G", "trait": "LDL"},
        {"variant": "10:100_A/G", "trait": "HDL"},
        {"variant": "10:900_G/A", "trait": "BMI"},
    ])
}

fn records(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}

/// Joins the first two dependency results with `join` on the `variant` field.
fn join_source(
    join: fn(&[Value], &[Value], &str, &str) -> undercomplicate::core::Result<Vec<Value>>,
) -> Arc<dyn DataSource> {
    Arc::new(FnSource::new(move |_, deps| {
        let left = deps.first().map(records).unwrap_or_default();
        let right = deps.get(1).map(records).unwrap_or_default();
        Ok(Value::Array(join(&left, &right, "variant", "variant")?))
    }))
}

fn sources(
    join: fn(&[Value], &[Value], &str, &str) -> undercomplicate::core::Result<Vec<Value>>,
) -> (SourceMap, Arc<Adapter<FixtureHooks>>, Arc<Adapter<FixtureHooks>>) {
    let assoc = Arc::new(Adapter::new(FixtureHooks::new("chr", assoc_records())));
    let catalog = Arc::new(Adapter::new(FixtureHooks::new("chr", catalog_records())));

    let mut map = SourceMap::new();
    map.insert("assoc".to_string(), assoc.clone() as Arc<dyn DataSource>);
    map.insert("catalog".to_string(), catalog.clone() as Arc<dyn DataSource>);
    map.insert("combined".to_string(), join_source(join));
    (map, assoc, catalog)
}

const DECLARATIONS: [&str; 3] = ["assoc", "catalog", "combined(assoc, catalog)"];

fn shared_options() -> RequestOptions {
    RequestOptions::new().with("chr", "10").with("start", 1).with("end", 1000)
}

/// A left join of two adapters through a linked request
#[tokio::test]
async fn test_left_join_of_two_adapters() -> Result<()> {
    init_test_logging(None);
    let (map, assoc, catalog) = sources(left_match);

    let result = get_linked_data(&shared_options(), &map, &DECLARATIONS, true).await?;

    assert_eq!(
        result,
        json!([
            {"variant": "10:100_A/G", "log_pvalue": 8.1, "trait": "LDL"},
            {"variant": "10:100_A/G", "log_pvalue": 8.1, "trait": "HDL"},
            {"variant": "10:250_C/T", "log_pvalue": 2.4},
        ])
    );
    assert_eq!(assoc.hooks().fetch_count(), 1);
    assert_eq!(catalog.hooks().fetch_count(), 1);
    Ok(())
}

/// Inner and full outer joins through the same request
#[tokio::test]
async fn test_inner_and_outer_joins() -> Result<()> {
    let (map, _, _) = sources(inner_match);
    let inner = get_linked_data(&shared_options(), &map, &DECLARATIONS, true).await?;
    assert_eq!(inner.as_array().map(Vec::len), Some(2));

    let (map, _, _) = sources(full_outer_match);
    let outer = get_linked_data(&shared_options(), &map, &DECLARATIONS, true).await?;
    let outer = records(&outer);
    assert_eq!(outer.len(), 4);
    assert_eq!(outer[3], json!({"variant": "10:900_G/A", "trait": "BMI"}));
    Ok(())
}

/// Unconsolidated requests report every source in execution order
#[tokio::test]
async fn test_unconsolidated_results() -> Result<()> {
    let (map, _, _) = sources(left_match);

    let result = get_linked_data(&shared_options(), &map, &DECLARATIONS, false).await?;
    let results = records(&result);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0], assoc_records());
    assert_eq!(results[1], catalog_records());
    Ok(())
}

/// Running the same linked request twice reuses every adapter's cache
#[tokio::test]
async fn test_repeat_linked_request_uses_cache() -> Result<()> {
    let (map, assoc, catalog) = sources(left_match);
    let request = LinkedRequest::new(&map, &DECLARATIONS)?;

    let first = request.execute(&shared_options(), true).await?;
    let second = request.execute(&shared_options(), true).await?;

    assert_eq!(first, second);
    assert_eq!(assoc.hooks().fetch_count(), 1);
    assert_eq!(catalog.hooks().fetch_count(), 1);
    Ok(())
}

/// One adapter registered under two aliases shares its cache
#[tokio::test]
async fn test_aliases_share_adapter_cache() -> Result<()> {
    let assoc = Arc::new(Adapter::new(FixtureHooks::new("chr", assoc_records())));
    let mut map = SourceMap::new();
    map.insert("primary".to_string(), assoc.clone() as Arc<dyn DataSource>);
    map.insert("secondary".to_string(), assoc.clone() as Arc<dyn DataSource>);
    map.insert(
        "namespaced".to_string(),
        Arc::new(FnSource::new(|_, deps| {
            let first = deps.into_iter().next().unwrap_or(Value::Null);
            prefix_namespace(first, "assoc")
        })),
    );

    let result = get_linked_data(
        &shared_options(),
        &map,
        &["primary", "secondary", "namespaced(primary)"],
        false,
    )
    .await?;

    assert_eq!(assoc.hooks().fetch_count(), 1);
    assert_eq!(result[2][0]["assoc:log_pvalue"], json!(8.1));
    Ok(())
}

/// Nothing is fetched when the declarations name a missing source
#[tokio::test]
async fn test_unknown_source_fetches_nothing() -> Result<()> {
    let (map, assoc, _) = sources(left_match);

    let err = get_linked_data(&shared_options(), &map, &["assoc", "ld(assoc)"], true)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnknownSource { ref name } if name == "ld"));
    assert_eq!(assoc.hooks().fetch_count(), 0);
    Ok(())
}

/// A failing join fails the whole request
#[tokio::test]
async fn test_join_error_propagates() -> Result<()> {
    let (mut map, _, _) = sources(left_match);
    map.insert(
        "combined".to_string(),
        Arc::new(FnSource::new(|_, deps| {
            let left = deps.first().map(records).unwrap_or_default();
            let right = deps.get(1).map(records).unwrap_or_default();
            Ok(Value::Array(left_match(&left, &right, "missing", "variant")?))
        })),
    );

    let err = get_linked_data(&shared_options(), &map, &DECLARATIONS, true).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingGroupField { .. }));
    Ok(())
}
