//! App directory layout.
//!
//! ```text
//! <root>/
//!   app.yaml
//!   components/params.libsonnet        root namespace
//!   components/<ns>/params.libsonnet   nested namespaces
//!   environments/<env>/params.libsonnet
//!   lib/k8s.libsonnet
//! ```

use ks_core::{AppConfig, APP_FILE};
use ks_jsonnet::Jsonnet;
use ks_params::ParamStore;
use ks_schema::SchemaTree;
use ks_types::{bail, EnvName, KsError, NamespaceName, Result, TemplateEvaluator};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory holding namespaces and components.
pub const COMPONENTS_DIR: &str = "components";

/// Directory holding per-environment overrides.
pub const ENVIRONMENTS_DIR: &str = "environments";

/// Directory holding template libraries.
pub const LIB_DIR: &str = "lib";

/// File name of every params document.
pub const PARAMS_FILE: &str = "params.libsonnet";

/// An app rooted at a directory containing `app.yaml`.
#[derive(Debug, Clone)]
pub struct App {
    root: PathBuf,
    config: AppConfig,
}

impl App {
    /// Create the app skeleton at `root`. Fails if `app.yaml` already exists.
    pub fn init(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let root = root.as_ref();
        if root.join(APP_FILE).exists() {
            bail!(Validation, "{:?} already holds an app", root);
        }

        std::fs::create_dir_all(root.join(COMPONENTS_DIR))?;
        std::fs::create_dir_all(root.join(ENVIRONMENTS_DIR))?;
        std::fs::create_dir_all(root.join(LIB_DIR))?;

        let config = AppConfig {
            name: name.to_string(),
            ..Default::default()
        };
        config.save(root)?;

        let app = Self {
            root: root.to_path_buf(),
            config,
        };
        app.namespace_params(&NamespaceName::root()).init()?;
        info!("Initialized app '{}' in {:?}", name, root);
        Ok(app)
    }

    /// Open the app rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.join(APP_FILE).is_file() {
            bail!(NotFound, "no {} in {:?}", APP_FILE, root);
        }
        let config = AppConfig::load(root)?;
        debug!("Opened app '{}' at {:?}", config.name, root);
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    /// Open the app containing `start`, searching parent directories.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        start
            .ancestors()
            .find(|dir| dir.join(APP_FILE).is_file())
            .map(Self::open)
            .unwrap_or_else(|| Err(KsError::NotFound(format!("no {} in {:?} or its parents", APP_FILE, start))))
    }

    /// App root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Mutable configuration; call [`App::save`] to persist.
    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Write `app.yaml`.
    pub fn save(&self) -> Result<()> {
        self.config.save(&self.root)
    }

    /// `components/`
    pub fn components_dir(&self) -> PathBuf {
        self.root.join(COMPONENTS_DIR)
    }

    /// Directory of a namespace.
    pub fn namespace_dir(&self, namespace: &NamespaceName) -> PathBuf {
        if namespace.is_root() {
            return self.components_dir();
        }
        self.components_dir().join(namespace.relative_dir())
    }

    /// Params store of a namespace.
    pub fn namespace_params(&self, namespace: &NamespaceName) -> ParamStore {
        ParamStore::new(self.namespace_dir(namespace).join(PARAMS_FILE))
    }

    /// Directory of an environment.
    pub fn environment_dir(&self, env: &EnvName) -> PathBuf {
        self.root.join(ENVIRONMENTS_DIR).join(env.as_str())
    }

    /// Params store of an environment.
    pub fn environment_params(&self, env: &EnvName) -> ParamStore {
        ParamStore::new(self.environment_dir(env).join(PARAMS_FILE))
    }

    /// Evaluator configured with the app's binary and search paths.
    pub fn evaluator(&self) -> Jsonnet {
        let jsonnet = &self.config.jsonnet;
        let evaluator = Jsonnet::new()
            .with_binary(&jsonnet.binary)
            .with_jpath(self.root.join(LIB_DIR));
        jsonnet
            .jpath
            .iter()
            .fold(evaluator, |evaluator, path| evaluator.with_jpath(self.root.join(path)))
    }

    /// Schema of the configured library: the pre-exported shape document if
    /// one is configured, otherwise the library reflected through `evaluator`.
    pub fn schema(&self, evaluator: &dyn TemplateEvaluator) -> Result<SchemaTree> {
        let library = &self.config.library;
        match &library.schema {
            Some(schema) => {
                debug!("Loading schema from {:?}", schema);
                SchemaTree::from_file(self.root.join(schema))
            }
            None => {
                let path = self.root.join(&library.path);
                if !path.is_file() {
                    bail!(NotFound, "schema library {:?}", path);
                }
                debug!("Reflecting schema from {:?}", path);
                SchemaTree::from_library(evaluator, path)
            }
        }
    }
}
