//! Component namespaces: directories under `components/` holding a params
//! file.

use crate::app::{App, PARAMS_FILE};
use crate::component::Component;
use ks_params::ParamStore;
use ks_types::{bail, NamespaceName, Result};
use std::path::PathBuf;
use tracing::info;
use walkdir::WalkDir;

/// A namespace of an app.
#[derive(Debug, Clone)]
pub struct Namespace {
    name: NamespaceName,
    dir: PathBuf,
    params: ParamStore,
}

impl Namespace {
    /// Create a namespace with an empty params file.
    pub fn create(app: &App, name: &NamespaceName) -> Result<Self> {
        let namespace = Self::at(app, name);
        if namespace.params.exists() {
            bail!(Validation, "namespace '{}' already exists", name);
        }
        std::fs::create_dir_all(&namespace.dir)?;
        namespace.params.init()?;
        info!("Created namespace '{}'", name);
        Ok(namespace)
    }

    /// An existing namespace.
    pub fn open(app: &App, name: &NamespaceName) -> Result<Self> {
        let namespace = Self::at(app, name);
        if !namespace.params.exists() {
            bail!(NotFound, "namespace '{}'", name);
        }
        Ok(namespace)
    }

    /// Every namespace of the app, sorted by name; the root comes first.
    pub fn list(app: &App) -> Result<Vec<Self>> {
        let root = app.components_dir();
        let mut namespaces = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| ks_types::KsError::Io(e.into()))?;
            if !entry.file_type().is_dir() || !entry.path().join(PARAMS_FILE).is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let segments: Vec<&str> = relative.iter().filter_map(|s| s.to_str()).collect();
            let name = NamespaceName::new(segments.join("/"))?;
            namespaces.push(Self::at(app, &name));
        }
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(namespaces)
    }

    fn at(app: &App, name: &NamespaceName) -> Self {
        Self {
            name: name.clone(),
            dir: app.namespace_dir(name),
            params: app.namespace_params(name),
        }
    }

    /// Namespace name.
    pub fn name(&self) -> &NamespaceName {
        &self.name
    }

    /// Namespace directory.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// The namespace's params store.
    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    /// Components directly in this namespace, sorted by name.
    pub fn components(&self) -> Result<Vec<Component>> {
        let mut components = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(component) = Component::from_path(&self.name, &path) {
                components.push(component?);
            }
        }
        components.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        Ok(components)
    }

    /// A component by name.
    pub fn component(&self, name: &str) -> Result<Component> {
        self.components()?
            .into_iter()
            .find(|c| c.name.as_str() == name)
            .ok_or_else(|| ks_types::KsError::NotFound(format!("component '{}' in namespace '{}'", name, self.name)))
    }

    /// Delete a component's source file and its parameters.
    pub fn remove_component(&self, name: &str) -> Result<Component> {
        let component = self.component(name)?;
        self.params.remove_component(name)?;
        std::fs::remove_file(&component.path)?;
        info!("Removed component '{}'", component);
        Ok(component)
    }
}
