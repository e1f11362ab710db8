//! Deployment environments declared in `app.yaml`.

use crate::app::App;
use ks_core::EnvironmentSpec;
use ks_params::ParamStore;
use ks_types::{bail, ClientConfig, EnvName, NamespaceName, Result};
use serde::Serialize;
use tracing::info;

/// An environment with its overrides file.
#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    /// Environment name
    pub name: EnvName,
    /// Declaration from `app.yaml`
    #[serde(flatten)]
    pub spec: EnvironmentSpec,
    #[serde(skip)]
    params: ParamStore,
}

impl Environment {
    /// Declare an environment and create its empty params file.
    pub fn add(app: &mut App, name: &EnvName, spec: EnvironmentSpec) -> Result<Self> {
        if app.config().environments.contains_key(name.as_str()) {
            bail!(Validation, "environment '{}' already exists", name);
        }
        for target in &spec.targets {
            NamespaceName::new(target)?;
        }

        let params = app.environment_params(name);
        params.init()?;
        app.config_mut()
            .environments
            .insert(name.to_string(), spec.clone());
        app.save()?;
        info!("Added environment '{}'", name);

        Ok(Self {
            name: name.clone(),
            spec,
            params,
        })
    }

    /// A declared environment.
    pub fn open(app: &App, name: &str) -> Result<Self> {
        let spec = app.config().environment(name)?.clone();
        let name = EnvName::new(name)?;
        Ok(Self {
            params: app.environment_params(&name),
            name,
            spec,
        })
    }

    /// Every declared environment, sorted by name.
    pub fn list(app: &App) -> Result<Vec<Self>> {
        app.config()
            .environments
            .keys()
            .map(|name| Self::open(app, name))
            .collect()
    }

    /// Replace the namespaces rendered into environment `name`.
    pub fn set_targets(app: &mut App, name: &str, targets: &[NamespaceName]) -> Result<Self> {
        let spec = app
            .config_mut()
            .environments
            .get_mut(name)
            .ok_or_else(|| ks_types::KsError::NotFound(format!("environment '{}'", name)))?;
        spec.targets = targets.iter().map(|ns| ns.to_string()).collect();
        app.save()?;
        info!("Environment '{}' now targets {:?}", name, targets.iter().map(|t| t.to_string()).collect::<Vec<_>>());
        Self::open(app, name)
    }

    /// The environment's override store.
    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    /// Namespaces rendered into this environment; `None` means all.
    pub fn targets(&self) -> Result<Option<Vec<NamespaceName>>> {
        if self.spec.targets.is_empty() {
            return Ok(None);
        }
        self.spec
            .targets
            .iter()
            .map(NamespaceName::new)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Cluster connection derived from the declaration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            context: self.spec.context.clone(),
            kubeconfig: None,
            namespace: self.spec.namespace.clone(),
            server: self.spec.server.clone(),
        }
    }
}
