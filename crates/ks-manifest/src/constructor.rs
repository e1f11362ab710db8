//! Grouping resolved setters into chained constructor expressions.

use crate::descriptor::DESCRIPTOR_DEPTH;
use crate::resolver::{Resolved, ResolvedParameter};
use indexmap::IndexMap;
use ks_jsonnet::Expr;
use ks_types::{bail, Result};
use serde_json::Value;
use std::collections::HashSet;

/// One setter call inside a group.
#[derive(Debug, Clone, PartialEq)]
pub struct SetterCall {
    /// Setter function name
    pub setter: String,
    /// Name of the parameter supplying the argument
    pub param_name: String,
    /// Value the parameter starts with
    pub value: Value,
}

/// Setter calls sharing one namespace, bound to one local.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorGroup {
    /// Local variable name
    pub name: String,
    /// Library path the setters hang off
    pub namespace: Vec<String>,
    /// Calls, sorted by setter name
    pub calls: Vec<SetterCall>,
}

impl ConstructorGroup {
    /// `<library>.<namespace>.setterA(<params>.argA).setterB(<params>.argB)`
    pub fn expression(&self, library: &str, params: &str) -> Expr {
        let base = self
            .namespace
            .iter()
            .fold(Expr::var(library), |expr, segment| expr.field(segment.as_str()));
        self.calls.iter().fold(base, |expr, call| {
            expr.field(call.setter.as_str())
                .call(vec![Expr::var(params).field(call.param_name.as_str())])
        })
    }
}

/// Groups keyed by dotted namespace, in first-seen order.
pub type Groups = IndexMap<String, ConstructorGroup>;

/// Builds [`ConstructorGroup`]s from resolved parameters.
#[derive(Debug, Default)]
pub struct ConstructorBuilder {
    param_names: HashSet<String>,
}

impl ConstructorBuilder {
    /// Fresh builder; parameter names are unique per builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Group by setter namespace and name each group and argument.
    pub fn build(mut self, resolved: &Resolved) -> Result<Groups> {
        let mut buckets: IndexMap<String, Vec<&ResolvedParameter>> = IndexMap::new();
        for parameter in resolved.values() {
            if parameter.setter.len() < 2 {
                bail!(InvalidSetterNamespace, "setter '{}' has no namespace", parameter.qualified_name());
            }
            buckets
                .entry(parameter.namespace().join("."))
                .or_default()
                .push(parameter);
        }

        let mut groups = Groups::new();
        for (key, mut members) in buckets {
            members.sort_by(|a, b| a.setter_name().cmp(b.setter_name()));
            let namespace = members[0].namespace().to_vec();

            let calls = members
                .into_iter()
                .map(|parameter| SetterCall {
                    setter: parameter.setter_name().to_string(),
                    param_name: self.unique_param_name(&parameter.manifest_path),
                    value: parameter.value.clone(),
                })
                .collect();

            groups.insert(
                key,
                ConstructorGroup {
                    name: group_name(&namespace),
                    namespace,
                    calls,
                },
            );
        }
        Ok(groups)
    }

    fn unique_param_name(&mut self, manifest_path: &[String]) -> String {
        let base = camel_join(manifest_path);
        let mut name = base.clone();
        let mut n = 2;
        while !self.param_names.insert(name.clone()) {
            name = format!("{}{}", base, n);
            n += 1;
        }
        name
    }
}

/// Local name for a namespace: the segments below group and version,
/// camel-joined (`apps.v1.deployment.mixin.metadata` → `deploymentMixinMetadata`).
pub fn group_name(namespace: &[String]) -> String {
    let below_version = namespace.get(DESCRIPTOR_DEPTH - 1..).unwrap_or(&[]);
    if below_version.is_empty() {
        camel_join(namespace)
    } else {
        camel_join(below_version)
    }
}

/// First segment as-is, the rest capitalised, non-identifier characters
/// dropped.
pub fn camel_join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let cleaned: String = segment
            .as_ref()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        let mut chars = cleaned.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.push(first);
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ManifestTree;
    use crate::resolver::PathResolver;
    use crate::testing::deployment_schema;
    use ks_jsonnet::print;
    use serde_json::json;

    fn parameter(setter: &str, manifest_path: &[&str], value: Value) -> ResolvedParameter {
        ResolvedParameter {
            manifest_path: manifest_path.iter().map(|s| s.to_string()).collect(),
            setter: setter.split('.').map(String::from).collect(),
            value,
        }
    }

    fn resolved(parameters: Vec<ResolvedParameter>) -> Resolved {
        parameters.into_iter().map(|p| (p.qualified_name(), p)).collect()
    }

    #[test]
    fn test_groups_sorted_and_named() {
        let input = resolved(vec![
            parameter("apps.v1.deployment.mixin.metadata.withName", &["metadata", "name"], json!("web")),
            parameter("apps.v1.deployment.mixin.spec.withReplicas", &["spec", "replicas"], json!(3)),
            parameter("apps.v1.deployment.mixin.metadata.withLabels", &["metadata", "labels"], json!({"app": "web"})),
        ]);
        let groups = ConstructorBuilder::new().build(&input).unwrap();

        let names: Vec<&str> = groups.values().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["deploymentMixinMetadata", "deploymentMixinSpec"]);

        let metadata = &groups["apps.v1.deployment.mixin.metadata"];
        let setters: Vec<&str> = metadata.calls.iter().map(|c| c.setter.as_str()).collect();
        assert_eq!(setters, vec!["withLabels", "withName"]);
        assert_eq!(metadata.calls[0].param_name, "metadataLabels");
        assert_eq!(
            print(&metadata.expression("k", "params")),
            "k.apps.v1.deployment.mixin.metadata.withLabels(params.metadataLabels).withName(params.metadataName)"
        );
    }

    #[test]
    fn test_short_setter_is_invalid() {
        let input = resolved(vec![parameter("withName", &["name"], json!("x"))]);
        let err = ConstructorBuilder::new().build(&input).unwrap_err();
        assert!(matches!(err, ks_types::KsError::InvalidSetterNamespace(_)));
    }

    #[test]
    fn test_param_names_stay_unique() {
        let input = resolved(vec![
            parameter("core.v1.configMap.withData", &["data", "aB"], json!(1)),
            parameter("core.v1.configMap.mixin.withData", &["dataA", "b"], json!(2)),
        ]);
        let groups = ConstructorBuilder::new().build(&input).unwrap();
        let mut names: Vec<String> = groups
            .values()
            .flat_map(|g| g.calls.iter().map(|c| c.param_name.clone()))
            .collect();
        names.sort();
        assert_eq!(names, vec!["dataAB", "dataAB2"]);
    }

    #[test]
    fn test_camel_join() {
        assert_eq!(camel_join(&["spec", "template", "spec"]), "specTemplateSpec");
        assert_eq!(camel_join(&["metadata", "cluster-name"]), "metadataClustername");
        assert_eq!(camel_join(&["8080"]), "_8080");
    }

    #[test]
    fn test_build_is_deterministic() {
        let tree = ManifestTree::from_yaml(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: a\n  labels: {x: y}\nspec:\n  replicas: 2\n",
        )
        .unwrap();
        let schema = deployment_schema();
        let first = ConstructorBuilder::new()
            .build(&PathResolver::new(&schema).resolve(&tree).unwrap())
            .unwrap();
        let second = ConstructorBuilder::new()
            .build(&PathResolver::new(&schema).resolve(&tree).unwrap())
            .unwrap();
        assert_eq!(first, second);
    }
}
