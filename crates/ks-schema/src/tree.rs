//! Schema object graph and path lookup.

use ks_types::{KsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Name of the indirection layer that holds merge-style setters.
pub const MIXIN: &str = "mixin";

/// One object of the library's exported graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Nested objects by name
    #[serde(default)]
    pub fields: BTreeMap<String, SchemaObject>,

    /// Names of function members (setters, constructors)
    #[serde(default)]
    pub functions: BTreeSet<String>,

    /// Names of type markers (`fooType`)
    #[serde(default)]
    pub types: BTreeSet<String>,
}

impl SchemaObject {
    /// Empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a nested object.
    pub fn with_field(mut self, name: impl Into<String>, object: SchemaObject) -> Self {
        self.fields.insert(name.into(), object);
        self
    }

    /// Add function members.
    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add type markers.
    pub fn with_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(names.into_iter().map(Into::into));
        self
    }

    fn mixin(&self) -> Option<&SchemaObject> {
        self.fields.get(MIXIN)
    }

    /// Whether any member answers to the property name `segment`.
    fn has_leaf(&self, segment: &str) -> bool {
        self.functions.contains(&setter_name(segment)) || self.types.contains(&type_name(segment))
    }
}

/// Classification of a lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Further nesting is available
    Object,
    /// A `withX` function
    Setter,
    /// A type marker, informational only
    Type,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Object => write!(f, "object"),
            NodeKind::Setter => write!(f, "setter"),
            NodeKind::Type => write!(f, "type"),
        }
    }
}

/// Result of [`SchemaTree::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// What was found
    pub kind: NodeKind,
    /// Canonical library path, including any `mixin` layers taken; for
    /// setters and types the last segment is the member name
    pub path: Vec<String>,
}

impl Lookup {
    /// Dotted canonical path.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// `replicas` → `withReplicas`
pub fn setter_name(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("with{}{}", first.to_uppercase(), chars.as_str()),
        None => "with".to_string(),
    }
}

/// `containers` → `containersType`
pub fn type_name(property: &str) -> String {
    format!("{}Type", property)
}

/// The library's object graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaTree {
    root: SchemaObject,
}

impl SchemaTree {
    /// Wrap a root object.
    pub fn new(root: SchemaObject) -> Self {
        Self { root }
    }

    /// Root object.
    pub fn root(&self) -> &SchemaObject {
        &self.root
    }

    /// Resolve a property path against the graph.
    ///
    /// Each segment is matched as a direct field first and through the
    /// current object's `mixin` layer second; a mixin hop becomes part of the
    /// returned canonical path. The final segment prefers a mixin setter,
    /// then a direct setter, then a nested object, then a type marker.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Result<Lookup> {
        let mut current = &self.root;
        let mut canonical: Vec<String> = Vec::with_capacity(path.len() + 2);

        let Some((last, parents)) = path.split_last() else {
            return Ok(Lookup {
                kind: NodeKind::Object,
                path: canonical,
            });
        };

        for (depth, segment) in parents.iter().enumerate() {
            let segment = segment.as_ref();
            let (next, hop) = descend(current, segment)
                .ok_or_else(|| miss(current, segment, &path[..=depth]))?;
            canonical.extend(hop.into_iter().map(str::to_string));
            current = next;
        }

        let segment = last.as_ref();
        let setter = setter_name(segment);
        let mixin = current.mixin();

        let (kind, tail): (NodeKind, Vec<&str>) =
            if mixin.is_some_and(|m| m.functions.contains(&setter)) {
                (NodeKind::Setter, vec![MIXIN, setter.as_str()])
            } else if current.functions.contains(&setter) {
                (NodeKind::Setter, vec![setter.as_str()])
            } else if let Some((_, hop)) = descend(current, segment) {
                (NodeKind::Object, hop)
            } else if current.types.contains(&type_name(segment)) {
                canonical.push(type_name(segment));
                return Ok(Lookup {
                    kind: NodeKind::Type,
                    path: canonical,
                });
            } else {
                return Err(KsError::NotFound(join(path)));
            };

        canonical.extend(tail.into_iter().map(str::to_string));
        Ok(Lookup {
            kind,
            path: canonical,
        })
    }
}

/// Step into `segment`: direct field first, then via the mixin layer.
fn descend<'a>(current: &'a SchemaObject, segment: &'a str) -> Option<(&'a SchemaObject, Vec<&'a str>)> {
    if let Some(next) = current.fields.get(segment) {
        return Some((next, vec![segment]));
    }
    current
        .mixin()
        .and_then(|mixin| mixin.fields.get(segment))
        .map(|next| (next, vec![MIXIN, segment]))
}

fn miss<S: AsRef<str>>(current: &SchemaObject, segment: &str, path: &[S]) -> KsError {
    let leaf = current.has_leaf(segment) || current.mixin().is_some_and(|m| m.has_leaf(segment));
    if leaf {
        KsError::NotAnObject(join(path))
    } else {
        KsError::NotFound(join(path))
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> SchemaObject {
        SchemaObject::new().with_functions(["withName", "withLabels", "withNamespace"])
    }

    fn schema() -> SchemaTree {
        let deployment = SchemaObject::new()
            .with_functions(["new"])
            .with_field(
                MIXIN,
                SchemaObject::new()
                    .with_field("metadata", metadata())
                    .with_field(
                        "spec",
                        SchemaObject::new()
                            .with_functions(["withReplicas"])
                            .with_types(["templateType"]),
                    ),
            );
        let service = SchemaObject::new()
            .with_functions(["new", "withKind"])
            .with_field(MIXIN, SchemaObject::new().with_functions(["withKind"]));

        SchemaTree::new(SchemaObject::new().with_field(
            "apps",
            SchemaObject::new().with_field(
                "v1",
                SchemaObject::new()
                    .with_field("deployment", deployment)
                    .with_field("service", service),
            ),
        ))
    }

    #[test]
    fn test_setter_through_mixin() {
        let found = schema().lookup(&["apps", "v1", "deployment", "metadata", "name"]).unwrap();
        assert_eq!(found.kind, NodeKind::Setter);
        assert_eq!(found.dotted(), "apps.v1.deployment.mixin.metadata.withName");
    }

    #[test]
    fn test_object_through_mixin() {
        let found = schema().lookup(&["apps", "v1", "deployment", "spec"]).unwrap();
        assert_eq!(found.kind, NodeKind::Object);
        assert_eq!(found.dotted(), "apps.v1.deployment.mixin.spec");
    }

    #[test]
    fn test_mixin_setter_preferred() {
        let found = schema().lookup(&["apps", "v1", "service", "kind"]).unwrap();
        assert_eq!(found.dotted(), "apps.v1.service.mixin.withKind");
    }

    #[test]
    fn test_type_marker() {
        let found = schema().lookup(&["apps", "v1", "deployment", "spec", "template"]).unwrap();
        assert_eq!(found.kind, NodeKind::Type);
        assert_eq!(found.dotted(), "apps.v1.deployment.mixin.spec.templateType");
    }

    #[test]
    fn test_leaf_in_the_middle_is_not_an_object() {
        let err = schema()
            .lookup(&["apps", "v1", "deployment", "metadata", "labels", "app"])
            .unwrap_err();
        assert!(matches!(err, KsError::NotAnObject(ref p) if p == "apps.v1.deployment.metadata.labels"));
    }

    #[test]
    fn test_unknown_segment_is_not_found() {
        let err = schema().lookup(&["apps", "v2", "deployment"]).unwrap_err();
        assert!(matches!(err, KsError::NotFound(ref p) if p == "apps.v2"));
        assert!(schema().lookup(&["apps", "v1", "deployment", "status"]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_setter_name() {
        assert_eq!(setter_name("replicas"), "withReplicas");
        assert_eq!(setter_name("apiVersion"), "withApiVersion");
    }
}
