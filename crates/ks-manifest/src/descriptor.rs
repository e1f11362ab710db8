//! Group/version/kind identity of a manifest.

use ks_types::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Groups whose library name is not their first DNS label.
const GROUP_ALIASES: &[(&str, &str)] = &[
    ("apiextensions.k8s.io", "apiextensions"),
    ("rbac.authorization.k8s.io", "rbac"),
    ("admissionregistration.k8s.io", "admissionregistration"),
    ("networking.k8s.io", "networking"),
    ("storage.k8s.io", "storage"),
    ("scheduling.k8s.io", "scheduling"),
    ("certificates.k8s.io", "certificates"),
    ("authentication.k8s.io", "authentication"),
    ("authorization.k8s.io", "authorization"),
];

/// Group used for `apiVersion` values without a group part.
pub const CORE_GROUP: &str = "core";

/// Number of leading segments a descriptor contributes to a property path.
pub const DESCRIPTOR_DEPTH: usize = 3;

/// Type identity derived from `apiVersion` and `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    group: String,
    version: String,
    kind: String,
}

impl TypeDescriptor {
    /// Parse `apiVersion` (`v1` or `group/version`) and `kind`.
    pub fn new(api_version: &str, kind: &str) -> Result<Self> {
        let api_version = api_version.trim();
        let kind = kind.trim();

        if api_version.is_empty() {
            bail!(InvalidManifest, "apiVersion is empty");
        }
        if kind.is_empty() {
            bail!(InvalidManifest, "kind is empty");
        }

        let (group, version) = match api_version.split('/').collect::<Vec<_>>().as_slice() {
            [version] => (CORE_GROUP.to_string(), version.to_string()),
            [group, version] if !group.is_empty() && !version.is_empty() => {
                (group.to_string(), version.to_string())
            }
            _ => bail!(InvalidManifest, "malformed apiVersion '{}'", api_version),
        };

        Ok(Self {
            group,
            version,
            kind: lower_first(kind),
        })
    }

    /// API group as written (`core` when absent).
    pub fn group(&self) -> &str {
        &self.group
    }

    /// API version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Kind, lower-camel-cased (`Deployment` → `deployment`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Library name of the group.
    pub fn group_path(&self) -> &str {
        if let Some((_, alias)) = GROUP_ALIASES.iter().find(|(group, _)| *group == self.group) {
            return alias;
        }
        match self.group.strip_suffix(".k8s.io") {
            Some(qualified) => qualified.split('.').next().unwrap_or(qualified),
            None => &self.group,
        }
    }

    /// Root lookup path into the schema: `[group, version, kind]`.
    pub fn path(&self) -> Vec<String> {
        vec![
            self.group_path().to_string(),
            self.version.clone(),
            self.kind.clone(),
        ]
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.group_path(), self.version, self.kind)
    }
}

fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_types::KsError;

    #[test]
    fn test_core_group() {
        let descriptor = TypeDescriptor::new("v1", "Service").unwrap();
        assert_eq!(descriptor.path(), vec!["core", "v1", "service"]);
    }

    #[test]
    fn test_named_group() {
        let descriptor = TypeDescriptor::new("apps/v1", "Deployment").unwrap();
        assert_eq!(descriptor.group(), "apps");
        assert_eq!(descriptor.to_string(), "apps.v1.deployment");
    }

    #[test]
    fn test_group_alias() {
        let descriptor =
            TypeDescriptor::new("apiextensions.k8s.io/v1beta1", "CustomResourceDefinition").unwrap();
        assert_eq!(
            descriptor.path(),
            vec!["apiextensions", "v1beta1", "customResourceDefinition"]
        );
        assert_eq!(descriptor.group(), "apiextensions.k8s.io");
    }

    #[test]
    fn test_unlisted_k8s_group_uses_first_label() {
        let descriptor = TypeDescriptor::new("policy.k8s.io/v1", "PodDisruptionBudget").unwrap();
        assert_eq!(descriptor.group_path(), "policy");
        let custom = TypeDescriptor::new("cert-manager.io/v1", "Certificate").unwrap();
        assert_eq!(custom.group_path(), "cert-manager.io");
    }

    #[test]
    fn test_invalid_descriptors() {
        for (api_version, kind) in [("", "Service"), ("v1", " "), ("a/b/c", "X"), ("/v1", "X")] {
            let err = TypeDescriptor::new(api_version, kind).unwrap_err();
            assert!(matches!(err, KsError::InvalidManifest(_)), "{} {}", api_version, kind);
        }
    }
}
