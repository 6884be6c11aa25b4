//! Record reshaping helpers for the post-processing stage.
//!
//! Consumers that read several sources side by side usually need the fields of each
//! source kept apart. [`prefix_namespace`] renames every field `f` to `namespace:f`,
//! and [`limit_fields`] keeps only the fields a consumer asked for.
//!
//! Both accept either a single record or an array of records. Array items that are not
//! objects pass through unchanged.

use serde_json::{Map, Value};

use crate::core::{PipelineError, Result};

/// Prepends `prefix` to every field name.
pub fn prefix_fields(records: Value, prefix: &str) -> Result<Value> {
    Ok(map_records(records, |record| {
        record.into_iter().map(|(k, v)| (format!("{prefix}{k}"), v)).collect()
    }))
}

/// Renames every field `f` to `namespace:f`.
pub fn prefix_namespace(records: Value, namespace: &str) -> Result<Value> {
    prefix_fields(records, &format!("{namespace}:"))
}

/// Keeps only `fields` in every record.
///
/// # Errors
///
/// Returns [`PipelineError::MissingField`] if a record lacks one of the fields.
pub fn limit_fields(records: Value, fields: &[&str]) -> Result<Value> {
    try_map_records(records, |mut record| {
        let mut limited = Map::with_capacity(fields.len());
        for &field in fields {
            let value = record.remove(field).ok_or_else(|| PipelineError::MissingField {
                field: field.to_string(),
            })?;
            limited.insert(field.to_string(), value);
        }
        Ok(limited)
    })
}

fn map_records(records: Value, mut f: impl FnMut(Map<String, Value>) -> Map<String, Value>) -> Value {
    match records {
        Value::Object(record) => Value::Object(f(record)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Value::Object(f(record)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

fn try_map_records(
    records: Value,
    mut f: impl FnMut(Map<String, Value>) -> Result<Map<String, Value>>,
) -> Result<Value> {
    match records {
        Value::Object(record) => Ok(Value::Object(f(record)?)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => f(record).map(Value::Object),
                other => Ok(other),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}
