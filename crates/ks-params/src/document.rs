//! Edits over parameter document source.
//!
//! The document has the shape `{global: {...}, components: {<name>: {...}}}`.
//! Every function takes source text and returns new source text; nothing
//! outside the edited field changes.

use crate::value::NamespaceParameter;
use ks_jsonnet::ast::{Expr, Member};
use ks_jsonnet::{literal, Document};
use ks_types::{bail, KsError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key holding parameters shared by every component.
pub const GLOBAL: &str = "global";

/// Key holding per-component parameters.
pub const COMPONENTS: &str = "components";

/// Source of an empty parameter document.
pub const EMPTY_DOCUMENT: &str = "{\n  global: {},\n  components: {},\n}\n";

/// Top-level parameters of `component`, rendered for display and sorted by
/// key. A component without an entry has no parameters.
pub fn component_params(source: &str, component: &str) -> Result<BTreeMap<String, String>> {
    params_at(source, &[COMPONENTS, component])
}

/// Top-level global parameters, rendered for display.
pub fn global_params(source: &str) -> Result<BTreeMap<String, String>> {
    params_at(source, &[GLOBAL])
}

/// Every component parameter as flat rows, sorted by component then key.
pub fn list(source: &str) -> Result<Vec<NamespaceParameter>> {
    let document = Document::parse(source)?;
    let Some(components) = document.field(&[COMPONENTS]) else {
        return Ok(Vec::new());
    };
    let members = components
        .value
        .as_object()
        .ok_or_else(|| KsError::NotAnObject(COMPONENTS.to_string()))?;

    let mut names: Vec<&str> = members.iter().filter_map(field_name).collect();
    names.sort_unstable();
    names.dedup();

    let mut rows = Vec::new();
    for component in names {
        for (key, value) in render_fields(&document, &[COMPONENTS, component])? {
            rows.push(NamespaceParameter {
                component: component.to_string(),
                index: 0,
                key,
                value,
            });
        }
    }
    Ok(rows)
}

/// Set `components.<component>.<path>` to `value`.
pub fn set_component_param<S: AsRef<str>>(source: &str, component: &str, path: &[S], value: &Value) -> Result<String> {
    set_at(source, rooted(&[COMPONENTS, component], path)?, value)
}

/// Set `global.<path>` to `value`.
pub fn set_global_param<S: AsRef<str>>(source: &str, path: &[S], value: &Value) -> Result<String> {
    set_at(source, rooted(&[GLOBAL], path)?, value)
}

/// Remove `components.<component>.<path>`.
pub fn delete_component_param<S: AsRef<str>>(source: &str, component: &str, path: &[S]) -> Result<String> {
    let full = rooted(&[COMPONENTS, component], path)?;
    Document::parse(source)?.remove_field(&full)
}

/// Remove `global.<path>`.
pub fn delete_global_param<S: AsRef<str>>(source: &str, path: &[S]) -> Result<String> {
    let full = rooted(&[GLOBAL], path)?;
    Document::parse(source)?.remove_field(&full)
}

/// Remove a component's whole entry, if present.
pub fn remove_component(source: &str, component: &str) -> Result<String> {
    let document = Document::parse(source)?;
    if document.field(&[COMPONENTS, component]).is_none() {
        return Ok(source.to_string());
    }
    document.remove_field(&[COMPONENTS, component])
}

fn rooted<S: AsRef<str>>(root: &[&str], path: &[S]) -> Result<Vec<String>> {
    if path.is_empty() {
        bail!(Validation, "parameter path is empty");
    }
    Ok(root
        .iter()
        .map(|s| s.to_string())
        .chain(path.iter().map(|s| s.as_ref().to_string()))
        .collect())
}

fn set_at(source: &str, path: Vec<String>, value: &Value) -> Result<String> {
    Document::parse(source)?.set_field(&path, &literal::from_json(value))
}

fn params_at(source: &str, path: &[&str]) -> Result<BTreeMap<String, String>> {
    let document = Document::parse(source)?;
    if document.field(path).is_none() {
        return Ok(BTreeMap::new());
    }
    Ok(render_fields(&document, path)?.into_iter().collect())
}

fn field_name(member: &Member) -> Option<&str> {
    match member {
        Member::Field(field) => field.key.name(),
        _ => None,
    }
}

/// Fields of the object at `path` with display values, sorted by key.
fn render_fields(document: &Document, path: &[&str]) -> Result<Vec<(String, String)>> {
    let Some(field) = document.field(path) else {
        return Ok(Vec::new());
    };
    let Some(members) = field.value.as_object() else {
        bail!(NotAnObject, "{}", path.join("."));
    };

    let mut rendered: BTreeMap<String, String> = BTreeMap::new();
    for member in members {
        let Member::Field(field) = member else {
            continue;
        };
        let Some(key) = field.key.name() else {
            continue;
        };
        rendered.insert(key.to_string(), render(document, &field.value));
    }
    Ok(rendered.into_iter().collect())
}

fn render(document: &Document, value: &Expr) -> String {
    match literal::to_json(value) {
        Some(json) => literal::display(&json),
        None => document.text(value).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PARAMS: &str = r#"local env = std.extVar("__ksonnet/environments");
{
  global: {
    namespace: "default",
  },
  components: {
    "guestbook-ui": {
      containerPort: 80,
      image: "gcr.io/heptio-images/ks-guestbook-demo:0.1",
      name: "guestbook-ui",
      replicas: 1,
      servicePort: 80,
      type: "ClusterIP",
    },
    redis: {
      labels: { app: "redis" },
      replicas: env.replicas,
    },
  },
}
"#;

    #[test]
    fn test_component_params() {
        let params = component_params(PARAMS, "guestbook-ui").unwrap();
        assert_eq!(params["type"], "\"ClusterIP\"");
        assert_eq!(params["servicePort"], "80");
        assert_eq!(params.keys().next().map(String::as_str), Some("containerPort"));

        let redis = component_params(PARAMS, "redis").unwrap();
        assert_eq!(redis["labels"], "{\"app\":\"redis\"}");
        assert_eq!(redis["replicas"], "env.replicas");

        assert!(component_params(PARAMS, "missing").unwrap().is_empty());
    }

    #[test]
    fn test_list_rows() {
        let rows = list(PARAMS).unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].component, "guestbook-ui");
        assert_eq!(rows[0].key, "containerPort");
        assert_eq!(rows[7].component, "redis");
        assert_eq!(rows[7].key, "replicas");
    }

    #[test]
    fn test_set_then_get() {
        let edited = set_component_param(PARAMS, "guestbook-ui", &["replicas"], &json!(4)).unwrap();
        assert_eq!(component_params(&edited, "guestbook-ui").unwrap()["replicas"], "4");
        assert_eq!(edited, PARAMS.replace("replicas: 1,", "replicas: 4,"));
    }

    #[test]
    fn test_set_new_component() {
        let edited = set_component_param(EMPTY_DOCUMENT, "nginx", &["metadataName"], &json!("nginx")).unwrap();
        assert_eq!(
            edited,
            "{\n  global: {},\n  components: {\n    nginx: {\n      metadataName: \"nginx\",\n    },\n  },\n}\n"
        );
    }

    #[test]
    fn test_set_global() {
        let edited = set_global_param(PARAMS, &["replicas"], &json!(2)).unwrap();
        assert_eq!(global_params(&edited).unwrap()["replicas"], "2");
        assert!(edited.ends_with(&PARAMS[PARAMS.find("  components").unwrap()..]));
    }

    #[test]
    fn test_delete() {
        let edited = delete_component_param(PARAMS, "guestbook-ui", &["replicas"]).unwrap();
        assert!(!component_params(&edited, "guestbook-ui").unwrap().contains_key("replicas"));
        assert_eq!(edited, PARAMS.replace("      replicas: 1,\n", ""));

        let err = delete_component_param(PARAMS, "guestbook-ui", &["nope"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_component() {
        let edited = remove_component(PARAMS, "redis").unwrap();
        assert!(component_params(&edited, "redis").unwrap().is_empty());
        assert_eq!(remove_component(&edited, "redis").unwrap(), edited);
    }

    #[test]
    fn test_edit_beside_comprehensions_and_slices() {
        let source = r#"local names = ["a", "b"];
local xs = [1, 2, 3];
{
  global: { first: xs[0:1] },
  components: {
    web: {
      extra: { [n]: 1 for n in names },
      ports: [p * 10 for p in xs if p > 1],
      replicas: 1,
    },
  },
}
"#;
        let edited = set_component_param(source, "web", &["replicas"], &json!(3)).unwrap();
        assert_eq!(edited, source.replace("replicas: 1,", "replicas: 3,"));
        assert!(edited.contains("extra: { [n]: 1 for n in names },"));
        assert!(edited.contains("global: { first: xs[0:1] },"));

        let params = component_params(&edited, "web").unwrap();
        assert_eq!(params["extra"], "{ [n]: 1 for n in names }");
        assert_eq!(params["ports"], "[p * 10 for p in xs if p > 1]");
        assert_eq!(global_params(&edited).unwrap()["first"], "xs[0:1]");
    }

    #[test]
    fn test_empty_path_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            set_global_param(PARAMS, &empty, &json!(1)),
            Err(KsError::Validation(_))
        ));
    }
}
