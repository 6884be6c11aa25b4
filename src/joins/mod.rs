//! Relational joins over lists of records.
//!
//! Each join matches records from `left` and `right` whose key fields hold equal
//! values, and merges every matching pair into one record. On a field-name conflict
//! the left value wins. Outputs never share data with the inputs.
//!
//! | join                 | unmatched left | unmatched right |
//! |----------------------|----------------|-----------------|
//! | [`left_match`]       | kept as-is     | dropped         |
//! | [`inner_match`]      | dropped        | dropped         |
//! | [`full_outer_match`] | kept as-is     | appended        |
//!
//! Key values must be primitive: strings, numbers or booleans. Numbers compare by
//! numeric value, so `1` and `1.0` match.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use undercomplicate::joins::inner_match;
//!
//! # fn example() -> undercomplicate::core::Result<()> {
//! let assoc = vec![json!({"gene_id": "G1", "pval": 0.05})];
//! let catalog = vec![json!({"gene_id": "G1", "catalog": true})];
//!
//! let joined = inner_match(&assoc, &catalog, "gene_id", "gene_id")?;
//! assert_eq!(joined, vec![json!({"gene_id": "G1", "pval": 0.05, "catalog": true})]);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::core::{PipelineError, Result};
use crate::models::deep_clone;

/// A primitive value usable as a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// String key
    Str(String),
    /// Numeric key, compared by `f64` value
    Num(u64),
    /// Boolean key
    Bool(bool),
}

impl GroupKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => {
                let n = n.as_f64()?;
                // -0.0 and 0.0 are the same key
                let n = if n == 0.0 { 0.0 } else { n };
                Some(Self::Num(n.to_bits()))
            }
            _ => None,
        }
    }
}

/// Groups `records` by the value of `key`, preserving input order within each group.
///
/// # Errors
///
/// Returns [`PipelineError::MissingGroupField`] if a record lacks `key`, and
/// [`PipelineError::NonPrimitiveGroupKey`] if its value is an object, array or null.
pub fn group_by<'a>(records: &'a [Value], key: &str) -> Result<HashMap<GroupKey, Vec<&'a Value>>> {
    let mut groups: HashMap<GroupKey, Vec<&Value>> = HashMap::new();
    for record in records {
        let value = record.get(key).ok_or_else(|| PipelineError::MissingGroupField {
            field: key.to_string(),
        })?;
        let group = GroupKey::from_value(value).ok_or_else(|| {
            PipelineError::NonPrimitiveGroupKey {
                field: key.to_string(),
            }
        })?;
        groups.entry(group).or_default().push(record);
    }
    Ok(groups)
}

/// Right fields overlaid by left fields.
fn merge(left: &Value, right: &Value) -> Value {
    let mut merged = deep_clone(right);
    if let (Some(target), Value::Object(source)) = (merged.as_object_mut(), left) {
        for (k, v) in source {
            target.insert(k.clone(), deep_clone(v));
        }
    }
    merged
}

fn match_records(
    left: &[Value],
    right: &[Value],
    left_key: &str,
    right_key: &str,
    keep_unmatched_left: bool,
) -> Result<Vec<Value>> {
    let right_groups = group_by(right, right_key)?;
    let mut results = Vec::with_capacity(left.len());

    for item in left {
        let value = item.get(left_key).ok_or_else(|| PipelineError::MissingGroupField {
            field: left_key.to_string(),
        })?;
        let group = GroupKey::from_value(value).ok_or_else(|| {
            PipelineError::NonPrimitiveGroupKey {
                field: left_key.to_string(),
            }
        })?;

        match right_groups.get(&group) {
            Some(matches) => results.extend(matches.iter().map(|right_item| merge(item, right_item))),
            None if keep_unmatched_left => results.push(deep_clone(item)),
            None => {}
        }
    }
    Ok(results)
}

/// Every left record, merged with each matching right record or kept as-is.
pub fn left_match(
    left: &[Value],
    right: &[Value],
    left_key: &str,
    right_key: &str,
) -> Result<Vec<Value>> {
    match_records(left, right, left_key, right_key, true)
}

/// Only left records with at least one matching right record, merged with each match.
pub fn inner_match(
    left: &[Value],
    right: &[Value],
    left_key: &str,
    right_key: &str,
) -> Result<Vec<Value>> {
    match_records(left, right, left_key, right_key, false)
}

/// [`left_match`] plus every right record whose key has no left counterpart.
pub fn full_outer_match(
    left: &[Value],
    right: &[Value],
    left_key: &str,
    right_key: &str,
) -> Result<Vec<Value>> {
    let mut results = left_match(left, right, left_key, right_key)?;
    let left_groups = group_by(left, left_key)?;
    let right_groups = group_by(right, right_key)?;

    // Walk `right` in input order so appended records keep a stable order
    let mut appended = HashSet::new();
    for item in right {
        if let Some(group) = item.get(right_key).and_then(GroupKey::from_value)
            && !left_groups.contains_key(&group)
            && appended.insert(group.clone())
            && let Some(unmatched) = right_groups.get(&group)
        {
            results.extend(unmatched.iter().map(|record| deep_clone(record)));
        }
    }
    Ok(results)
}
