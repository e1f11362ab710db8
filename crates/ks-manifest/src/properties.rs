//! A manifest split into its type descriptor and property tree.

use crate::descriptor::TypeDescriptor;
use ks_types::{bail, KsError, Result};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

/// A leaf location: the descriptor path followed by property keys.
pub type PropertyPath = Vec<String>;

/// Parsed manifest.
#[derive(Debug, Clone)]
pub struct ManifestTree {
    descriptor: TypeDescriptor,
    properties: Map<String, Value>,
    paths: OnceCell<Vec<PropertyPath>>,
}

impl ManifestTree {
    /// Split a manifest document. `apiVersion` and `kind` must be present
    /// non-empty strings; they are removed from the property tree.
    pub fn new(document: Value) -> Result<Self> {
        let Value::Object(mut properties) = document else {
            bail!(InvalidManifest, "manifest is not a mapping");
        };

        let api_version = take_string(&mut properties, "apiVersion")?;
        let kind = take_string(&mut properties, "kind")?;
        let descriptor = TypeDescriptor::new(&api_version, &kind)?;

        Ok(Self {
            descriptor,
            properties,
            paths: OnceCell::new(),
        })
    }

    /// Parse a single YAML (or JSON) document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| KsError::InvalidManifest(format!("unreadable manifest: {}", e)))?;
        Self::new(document)
    }

    /// Type identity.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Properties other than `apiVersion` and `kind`.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// `metadata.name`, when set.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("metadata")?.get("name")?.as_str()
    }

    /// Every leaf path, sorted, each prefixed with the descriptor path.
    ///
    /// Scalars, arrays and empty mappings are leaves; non-empty mappings are
    /// descended into.
    pub fn paths(&self) -> &[PropertyPath] {
        self.paths.get_or_init(|| {
            let mut paths = Vec::new();
            collect_leaves(&self.properties, &mut self.descriptor.path(), &mut paths);
            paths.sort();
            paths
        })
    }

    /// Raw value at a property path (without the descriptor prefix).
    pub fn value<S: AsRef<str>>(&self, path: &[S]) -> Result<&Value> {
        let Some((first, rest)) = path.split_first() else {
            bail!(NotFound, "empty property path");
        };

        let mut current = self
            .properties
            .get(first.as_ref())
            .ok_or_else(|| not_found(path))?;
        for segment in rest {
            current = current
                .as_object()
                .and_then(|map| map.get(segment.as_ref()))
                .ok_or_else(|| not_found(path))?;
        }
        Ok(current)
    }
}

fn take_string(properties: &mut Map<String, Value>, key: &str) -> Result<String> {
    match properties.remove(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value),
        Some(Value::String(_)) | None => bail!(InvalidManifest, "manifest has no {}", key),
        Some(other) => bail!(InvalidManifest, "{} must be a string, found {}", key, other),
    }
}

fn collect_leaves(map: &Map<String, Value>, prefix: &mut Vec<String>, out: &mut Vec<PropertyPath>) {
    for (key, value) in map {
        prefix.push(key.clone());
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_leaves(nested, prefix, out),
            _ => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}

fn not_found<S: AsRef<str>>(path: &[S]) -> KsError {
    KsError::NotFound(path.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
  labels:
    app: nginx
  annotations: {}
spec:
  replicas: 3
  template:
    spec:
      containers:
        - name: nginx
          image: nginx:1.7.9
"#;

    fn joined(paths: &[PropertyPath]) -> Vec<String> {
        paths.iter().map(|p| p.join(".")).collect()
    }

    #[test]
    fn test_paths_sorted_and_prefixed() {
        let tree = ManifestTree::from_yaml(DEPLOYMENT).unwrap();
        assert_eq!(
            joined(tree.paths()),
            vec![
                "apps.v1.deployment.metadata.annotations",
                "apps.v1.deployment.metadata.labels.app",
                "apps.v1.deployment.metadata.name",
                "apps.v1.deployment.spec.replicas",
                "apps.v1.deployment.spec.template.spec.containers",
            ]
        );
    }

    #[test]
    fn test_value_lookup() {
        let tree = ManifestTree::from_yaml(DEPLOYMENT).unwrap();
        assert_eq!(tree.value(&["metadata", "labels"]).unwrap(), &json!({"app": "nginx"}));
        assert_eq!(tree.value(&["spec", "replicas"]).unwrap(), &json!(3));
        assert!(tree.value(&["spec", "replicas", "x"]).unwrap_err().is_not_found());
        assert!(tree.value(&["status"]).unwrap_err().is_not_found());
        assert_eq!(tree.name(), Some("nginx-deployment"));
    }

    #[test]
    fn test_missing_type_fields() {
        for doc in [json!({"kind": "Service"}), json!({"apiVersion": "v1"}), json!([1, 2])] {
            assert!(matches!(ManifestTree::new(doc), Err(KsError::InvalidManifest(_))));
        }
        assert!(matches!(
            ManifestTree::new(json!({"apiVersion": "v1", "kind": 3})),
            Err(KsError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_unparseable_yaml_is_invalid_manifest() {
        assert!(matches!(
            ManifestTree::from_yaml("kind: [unclosed"),
            Err(KsError::InvalidManifest(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_paths_are_sorted_and_resolvable(
            props in proptest::collection::btree_map("[a-z]{1,3}", proptest::collection::btree_map("[a-z]{1,3}", 0i64..10, 0..3), 0..5)
        ) {
            let mut doc = serde_json::to_value(&props).unwrap();
            doc["apiVersion"] = json!("v1");
            doc["kind"] = json!("ConfigMap");
            let tree = ManifestTree::new(doc).unwrap();
            let paths = tree.paths();
            proptest::prop_assert!(paths.windows(2).all(|w| w[0] < w[1]));
            for path in paths {
                proptest::prop_assert!(tree.value(&path[3..]).is_ok());
            }
        }
    }
}
