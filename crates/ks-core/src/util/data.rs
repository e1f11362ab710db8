//! YAML and JSON data handling utilities.

use ks_types::{KsError, Result};
use serde_json::Value;
use std::path::Path;
use std::fs;

/// Load every document of a (possibly multi-document) YAML string.
///
/// Empty documents are skipped.
pub fn load_yaml_documents(content: &str) -> Result<Vec<Value>> {
    use serde::Deserialize;

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Load every document of a YAML file.
pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| KsError::Io(std::io::Error::new(e.kind(), format!("{:?}: {}", path, e))))?;
    load_yaml_documents(&content)
}

/// Deep merge two values.
/// Recursively merges objects, with overlay values taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.remove(&key) {
                    Some(base_val) => {
                        base_map.insert(key, deep_merge(base_val, overlay_val));
                    }
                    None => {
                        base_map.insert(key, overlay_val);
                    }
                }
            }
            Value::Object(base_map)
        }
        (_, overlay_val) => overlay_val,
    }
}

/// Apply a JSON merge patch (RFC 7386) to `target`.
///
/// Same as [`deep_merge`] except that `null` in the patch removes the key.
pub fn merge_patch(target: Value, patch: Value) -> Value {
    match patch {
        Value::Object(patch_map) => {
            let mut target_map = match target {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            for (key, patch_val) in patch_map {
                if patch_val.is_null() {
                    target_map.remove(&key);
                } else {
                    let current = target_map.remove(&key).unwrap_or(Value::Null);
                    target_map.insert(key, merge_patch(current, patch_val));
                }
            }
            Value::Object(target_map)
        }
        other => other,
    }
}

/// Flatten a nested value into dotted paths.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    fn flatten_recursive(value: &Value, prefix: String, result: &mut Vec<(String, Value)>) {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, val) in map {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    flatten_recursive(val, new_prefix, result);
                }
            }
            _ => {
                result.push((prefix, value.clone()));
            }
        }
    }

    let mut result = Vec::new();
    flatten_recursive(value, String::new(), &mut result);
    result
}

/// Get value at a path in dotted notation.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            Value::Array(arr) => {
                let index: usize = part.parse().ok()?;
                current = arr.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let base = json!({"a": {"b": 1, "c": 2}, "d": [1]});
        let overlay = json!({"a": {"c": 3}, "d": [2]});
        assert_eq!(deep_merge(base, overlay), json!({"a": {"b": 1, "c": 3}, "d": [2]}));
    }

    #[test]
    fn test_merge_patch_removes_nulls() {
        let target = json!({"replicas": 1, "image": "nginx", "labels": {"app": "x"}});
        let patch = json!({"replicas": 3, "image": null, "labels": {"tier": "web"}});
        assert_eq!(
            merge_patch(target, patch),
            json!({"replicas": 3, "labels": {"app": "x", "tier": "web"}})
        );
    }

    #[test]
    fn test_flatten_and_get_path() {
        let value = json!({"metadata": {"name": "web", "labels": {}}, "spec": {"ports": [80]}});
        let flat = flatten(&value);
        assert_eq!(flat.len(), 3);
        assert!(flat.contains(&("metadata.labels".to_string(), json!({}))));
        assert_eq!(get_path(&value, "spec.ports.0"), Some(&json!(80)));
        assert_eq!(get_path(&value, "spec.missing"), None);
    }

    #[test]
    fn test_load_multi_document_yaml() {
        let docs = load_yaml_documents("a: 1\n---\n---\nb: 2\n").unwrap();
        assert_eq!(docs, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    proptest::proptest! {
        #[test]
        fn prop_merge_patch_with_self_is_identity(keys in proptest::collection::btree_map("[a-z]{1,4}", 0i64..100, 0..6)) {
            let value = serde_json::to_value(&keys).unwrap();
            proptest::prop_assert_eq!(merge_patch(value.clone(), value.clone()), value);
        }
    }
}
