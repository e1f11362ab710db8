//! Components: one source file each, inside a namespace directory.

use ks_types::{ComponentFormat, ComponentName, NamespaceName, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A stored component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Name, the file stem
    pub name: ComponentName,
    /// Owning namespace
    pub namespace: NamespaceName,
    /// Source file
    pub path: PathBuf,
    /// Source format
    pub format: ComponentFormat,
}

impl Component {
    /// Classify a file in `namespace`. `None` if the file is not a component.
    pub fn from_path(namespace: &NamespaceName, path: impl AsRef<Path>) -> Option<Result<Self>> {
        let path = path.as_ref();
        let format = ComponentFormat::from_path(path)?;
        Some(ComponentName::from_path(path).map(|name| Self {
            name,
            namespace: namespace.clone(),
            path: path.to_path_buf(),
            format,
        }))
    }

    /// `<namespace>/<name>`, or just the name in the root namespace.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_root() {
            self.name.to_string()
        } else {
            format!("{}/{}", self.namespace.as_str(), self.name)
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}
