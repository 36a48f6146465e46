//! Explicitly-set field maps and the pure diff function.
//!
//! A node's fields are carried as a sorted map of JSON values containing
//! exactly the fields explicitly authored on the node. Inherited, default,
//! and computed values are never present; the versioned store's inheritance
//! model recomputes them.

use std::collections::BTreeMap;

use serde_json::Value;

/// An explicitly-set field mapping: field name -> JSON value.
pub type FieldMap = BTreeMap<String, Value>;

/// Outcome of diffing a draft node's fields against a published block.
#[derive(Debug, Clone)]
pub struct FieldDiff {
    /// The merged field map to persist.
    pub fields: FieldMap,
    /// Names of fields that were set on the target but are no longer
    /// explicitly set on the source (they revert to default/inherited).
    pub removed: Vec<String>,
}

/// Merge a draft node's explicit fields over a published block's fields.
///
/// The result contains exactly the source's explicit fields: anything set on
/// the target but absent from the source reverts to default/inherited, and
/// every source field wins over the target's value. The caller persists the
/// result; this function never touches a live block.
pub fn apply_diff(source: &FieldMap, target: &FieldMap) -> FieldDiff {
    let removed = target
        .keys()
        .filter(|name| !source.contains_key(*name))
        .cloned()
        .collect();
    FieldDiff {
        fields: source.clone(),
        removed,
    }
}

/// Read a `children`-style field as an ordered list of strings.
///
/// Missing field or non-array value yields an empty list; non-string entries
/// are skipped.
pub fn string_list(fields: &FieldMap, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Write an ordered list of strings back into a field map.
pub fn set_string_list(fields: &mut FieldMap, key: &str, values: Vec<String>) {
    fields.insert(
        key.to_string(),
        Value::Array(values.into_iter().map(Value::String).collect()),
    );
}
