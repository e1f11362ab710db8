//! Type-safe identifiers for namespaces, components, and environments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use crate::errors::{KsError, Result};

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => chars.all(is_name_char),
        _ => false,
    }
}

/// A validated component name.
///
/// Component names are derived from the stem of their source file, so they
/// may contain letters, digits, `-`, `_` and `.`, and must start with a
/// letter or digit.
///
/// # Example
///
/// ```
/// use ks_types::ComponentName;
///
/// let name = ComponentName::from_path("manifests/guestbook-ui.yaml").unwrap();
/// assert_eq!(name.as_str(), "guestbook-ui");
///
/// assert!(ComponentName::new("-bad").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentName(String);

impl ComponentName {
    /// Create a new validated component name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name doesn't meet validation requirements.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !is_valid_segment(name) {
            return Err(KsError::Validation(format!(
                "Invalid component name '{}': must start with a letter or digit and contain only \
                letters, digits, '-', '_' and '.'",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// Derive a component name from a file path (the file stem).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| KsError::Validation(
                format!("Cannot extract component name from path: {:?}", path)
            ))?;

        Self::new(stem)
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ComponentName {
    type Err = KsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A component namespace: a `/`-separated directory path under `components/`.
///
/// The empty path is the root namespace and displays as `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Create a new validated namespace name. `""` and `"/"` are the root.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let trimmed = name.as_ref().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        if let Some(bad) = trimmed.split('/').find(|s| !is_valid_segment(s)) {
            return Err(KsError::Validation(format!(
                "Invalid namespace '{}': segment '{}' must start with a letter or digit",
                name.as_ref(),
                bad
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The root namespace.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Whether this is the root namespace.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments; empty for the root.
    pub fn segments(&self) -> Vec<&str> {
        if self.is_root() {
            Vec::new()
        } else {
            self.0.split('/').collect()
        }
    }

    /// Relative directory of this namespace under the components root.
    pub fn relative_dir(&self) -> std::path::PathBuf {
        self.segments().iter().collect()
    }

    /// Get the name as a string slice (empty for the root).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for NamespaceName {
    type Err = KsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A validated environment name.
///
/// Environment names must:
/// - Start with a lowercase letter or digit
/// - Contain only lowercase letters, digits, hyphens and underscores
/// - Not end with a hyphen
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvName(String);

impl EnvName {
    /// Create a new validated environment name.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(KsError::Validation(format!(
                "Invalid environment name '{}': must contain only lowercase letters, digits, '-' and '_', \
                and must start with a letter or digit",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// Check if a name is valid without allocating.
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };

        if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
            return false;
        }

        !name.ends_with('-')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EnvName {
    type Err = KsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_name_validation() {
        assert!(ComponentName::new("guestbook-ui").is_ok());
        assert!(ComponentName::new("redis.master_0").is_ok());
        assert!(ComponentName::new("").is_err());
        assert!(ComponentName::new("_hidden").is_err());
        assert!(ComponentName::new("a/b").is_err());
    }

    #[test]
    fn test_component_name_from_path() {
        let name = ComponentName::from_path("/tmp/x/nginx-deployment.yml").unwrap();
        assert_eq!(name.as_str(), "nginx-deployment");
    }

    #[test]
    fn test_namespace_root() {
        assert!(NamespaceName::new("/").unwrap().is_root());
        assert!(NamespaceName::new("").unwrap().is_root());
        assert_eq!(NamespaceName::root().to_string(), "/");
        assert!(NamespaceName::root().segments().is_empty());
    }

    #[test]
    fn test_namespace_nested() {
        let ns = NamespaceName::new("/apps/web/").unwrap();
        assert_eq!(ns.as_str(), "apps/web");
        assert_eq!(ns.relative_dir(), std::path::PathBuf::from("apps").join("web"));
        assert!(NamespaceName::new("apps//web").is_err());
    }

    #[test]
    fn test_env_name_validation() {
        assert!(EnvName::new("default").is_ok());
        assert!(EnvName::new("us-west_2").is_ok());
        assert!(EnvName::new("Prod").is_err());
        assert!(EnvName::new("-prod").is_err());
        assert!(EnvName::new("prod-").is_err());
        assert!(EnvName::new("").is_err());
    }
}
