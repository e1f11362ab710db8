//! Configuration management for ks.
//!
//! This module provides layered configuration support with:
//! - File-based configuration (`app.yaml`)
//! - Environment variable overrides
//!
//! ## Configuration Layers
//!
//! Configuration values are resolved in this priority order:
//! 1. Environment variables
//! 2. Values loaded from file
//! 3. Default values
//!
//! Environment overrides apply to the loaded configuration only; saving
//! writes back what the file and later edits hold.
//!
//! ## Example
//!
//! ```no_run
//! use ks_core::config::AppConfig;
//!
//! let config = AppConfig::load(".")?;
//! println!("library: {:?}", config.library.path);
//! # Ok::<(), ks_types::KsError>(())
//! ```

use ks_types::{KsError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::fs;

/// Environment variables that override `app.yaml` keys.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("KS_JSONNET_BIN", "jsonnet.binary"),
    ("KS_LIBRARY_PATH", "library.path"),
    ("KS_LIBRARY_IMPORT", "library.import"),
];

/// Configuration layer priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigLayer {
    /// Default values
    Default = 0,
    /// Values loaded from file
    Loaded = 1,
    /// Values from environment variables
    Environment = 2,
}

const LAYERS_BY_PRIORITY: [ConfigLayer; 3] = [
    ConfigLayer::Environment,
    ConfigLayer::Loaded,
    ConfigLayer::Default,
];

/// Low-level configuration with multi-layer support.
#[derive(Clone, Debug, Default)]
pub struct Config {
    layers: HashMap<ConfigLayer, Value>,
    overridden: Vec<String>,
}

impl Config {
    /// Create a configuration from a file path.
    ///
    /// If the file doesn't exist, an empty configuration is created.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut layers = HashMap::new();

        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| KsError::Config(format!("Failed to read {:?}: {}", path, e)))?;

            let value: Value = serde_yaml::from_str(&content)
                .map_err(|e| KsError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

            if !value.is_null() {
                layers.insert(ConfigLayer::Loaded, value);
            }
        }

        Ok(Self {
            layers,
            overridden: Vec::new(),
        })
    }

    /// Install a layer of default values.
    pub fn with_defaults(mut self, defaults: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(defaults)
            .map_err(|e| KsError::Config(format!("Failed to serialize defaults: {}", e)))?;
        self.layers.insert(ConfigLayer::Default, value);
        Ok(self)
    }

    /// Apply environment variable overrides from a `(variable, dotted.key)` table.
    pub fn with_env_overrides(mut self, table: &[(&str, &str)]) -> Result<Self> {
        for (var, key) in table {
            if let Ok(value) = std::env::var(var) {
                tracing::debug!("{} overrides '{}'", var, key);
                let layer = self
                    .layers
                    .entry(ConfigLayer::Environment)
                    .or_insert_with(|| Value::Object(Default::default()));
                set_value_at_path(layer, key, Value::String(value))?;
                self.overridden.push(key.to_string());
            }
        }
        Ok(self)
    }

    /// Dotted keys set by the environment layer.
    pub fn overridden(&self) -> &[String] {
        &self.overridden
    }

    /// Value of `key` from the first layer at or below `ceiling` that has it.
    pub fn get_below<T: for<'de> Deserialize<'de>>(&self, ceiling: ConfigLayer, key: &str) -> Option<T> {
        LAYERS_BY_PRIORITY
            .iter()
            .filter(|layer| **layer <= ceiling)
            .filter_map(|layer| self.layers.get(layer))
            .filter_map(|data| crate::util::data::get_path(data, key))
            .find_map(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Merged data from all layers, lowest priority first.
    pub fn merged_data(&self) -> Value {
        LAYERS_BY_PRIORITY
            .iter()
            .rev()
            .filter_map(|layer| self.layers.get(layer))
            .fold(Value::Object(Default::default()), |merged, data| {
                crate::util::data::deep_merge(merged, data.clone())
            })
    }
}

fn set_value_at_path(data: &mut Value, path: &str, value: Value) -> Result<()> {
    let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| KsError::Config("Empty configuration key".to_string()))?;

    let mut current = data;
    for part in parents {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        let Value::Object(map) = current else {
            return Err(KsError::Bug(format!("'{}' is not a mapping after reset", part)));
        };
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }

    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        _ => Err(KsError::Config(format!("Cannot set '{}': parent is not a mapping", path))),
    }
}

/// Schema library settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library file, relative to the app root
    #[serde(default = "default_library_path")]
    pub path: PathBuf,

    /// Import path written into generated components
    #[serde(default = "default_library_import")]
    pub import: String,

    /// Pre-exported schema shape document (JSON or YAML), relative to the app root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<PathBuf>,
}

fn default_library_path() -> PathBuf {
    PathBuf::from("lib").join("k8s.libsonnet")
}

fn default_library_import() -> String {
    "k8s.libsonnet".to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: default_library_path(),
            import: default_library_import(),
            schema: None,
        }
    }
}

/// Template evaluator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonnetConfig {
    /// Evaluator binary
    #[serde(default = "default_jsonnet_binary")]
    pub binary: PathBuf,

    /// Extra library search paths, relative to the app root
    #[serde(default)]
    pub jpath: Vec<PathBuf>,
}

fn default_jsonnet_binary() -> PathBuf {
    PathBuf::from("jsonnet")
}

impl Default for JsonnetConfig {
    fn default() -> Self {
        Self {
            binary: default_jsonnet_binary(),
            jpath: Vec::new(),
        }
    }
}

/// A deployment environment declared in `app.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// API server URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Kubernetes namespace objects land in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// kubeconfig context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Component namespaces rendered into this environment; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

/// A key the environment changed at load time, with the value it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverride {
    /// Dotted key
    pub key: String,
    /// Value the environment supplied
    pub applied: Value,
    /// Value from the file or defaults
    pub stored: Value,
}

/// App configuration (`app.yaml` at the app root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// App name
    #[serde(default)]
    pub name: String,

    /// Schema library settings
    #[serde(default)]
    pub library: LibraryConfig,

    /// Evaluator settings
    #[serde(default)]
    pub jsonnet: JsonnetConfig,

    /// Environments by name
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentSpec>,

    /// Environment overrides in effect; never written back
    #[serde(skip)]
    pub overrides: Vec<EnvOverride>,
}

fn default_api_version() -> String {
    "0.1".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            name: String::new(),
            library: LibraryConfig::default(),
            jsonnet: JsonnetConfig::default(),
            environments: BTreeMap::new(),
            overrides: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load the app configuration from `<root>/app.yaml`, applying defaults
    /// and environment overrides.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(crate::APP_FILE);
        let config = Config::load(&path)?
            .with_defaults(AppConfig::default())?
            .with_env_overrides(ENV_OVERRIDES)?;

        let merged = config.merged_data();
        let overrides = config
            .overridden()
            .iter()
            .map(|key| EnvOverride {
                key: key.clone(),
                applied: crate::util::data::get_path(&merged, key).cloned().unwrap_or(Value::Null),
                stored: config.get_below(ConfigLayer::Loaded, key).unwrap_or(Value::Null),
            })
            .collect();

        let mut app: AppConfig = serde_json::from_value(merged)
            .map_err(|e| KsError::Config(format!("Failed to parse {:?}: {}", path, e)))?;
        app.overrides = overrides;
        Ok(app)
    }

    /// Write the configuration to `<root>/app.yaml`. Keys still holding an
    /// environment override are written with their stored value.
    pub fn save(&self, root: impl AsRef<Path>) -> Result<()> {
        let persisted = self.persisted()?;
        let yaml = serde_yaml::to_string(&persisted)
            .map_err(|e| KsError::Config(format!("Failed to serialize app config: {}", e)))?;
        crate::util::fs::write_atomic(root.as_ref().join(crate::APP_FILE), yaml.as_bytes())
    }

    fn persisted(&self) -> Result<AppConfig> {
        if self.overrides.is_empty() {
            return Ok(self.clone());
        }

        let mut data = serde_json::to_value(self)
            .map_err(|e| KsError::Config(format!("Failed to serialize app config: {}", e)))?;
        for entry in &self.overrides {
            if crate::util::data::get_path(&data, &entry.key) == Some(&entry.applied) {
                set_value_at_path(&mut data, &entry.key, entry.stored.clone())?;
            }
        }
        serde_json::from_value(data)
            .map_err(|e| KsError::Config(format!("Failed to restore app config: {}", e)))
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentSpec> {
        self.environments
            .get(name)
            .ok_or_else(|| KsError::NotFound(format!("environment '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_layers() {
        let mut config = Config::default();

        config.layers.insert(
            ConfigLayer::Default,
            serde_json::json!({"key": "default_value", "other": 1}),
        );
        config.layers.insert(
            ConfigLayer::Loaded,
            serde_json::json!({"key": "loaded_value"}),
        );
        config.layers.insert(
            ConfigLayer::Environment,
            serde_json::json!({"key": "env_value"}),
        );

        let value: String = config.get_below(ConfigLayer::Environment, "key").unwrap();
        assert_eq!(value, "env_value");
        let value: String = config.get_below(ConfigLayer::Loaded, "key").unwrap();
        assert_eq!(value, "loaded_value");
        let other: u32 = config.get_below(ConfigLayer::Loaded, "other").unwrap();
        assert_eq!(other, 1);
        assert_eq!(config.merged_data()["key"], "env_value");
    }

    #[test]
    fn test_env_override_not_saved() {
        let dir = TempDir::new().unwrap();
        AppConfig {
            name: "guestbook".to_string(),
            ..Default::default()
        }
        .save(dir.path())
        .unwrap();

        std::env::set_var("KS_JSONNET_BIN", "/opt/jsonnet/bin/jsonnet");
        let loaded = AppConfig::load(dir.path());
        std::env::remove_var("KS_JSONNET_BIN");
        let mut loaded = loaded.unwrap();
        assert_eq!(loaded.jsonnet.binary, PathBuf::from("/opt/jsonnet/bin/jsonnet"));

        loaded.name = "renamed".to_string();
        loaded.save(dir.path()).unwrap();

        let reloaded = AppConfig::load(dir.path()).unwrap();
        assert_eq!(reloaded.jsonnet.binary, PathBuf::from("jsonnet"));
        assert_eq!(reloaded.name, "renamed");
        assert!(reloaded.overrides.is_empty());
    }

    #[test]
    fn test_edited_override_is_saved() {
        let mut config = AppConfig::default();
        config.overrides.push(EnvOverride {
            key: "library.import".to_string(),
            applied: Value::String("override.libsonnet".to_string()),
            stored: Value::String("k8s.libsonnet".to_string()),
        });
        config.library.import = "override.libsonnet".to_string();
        assert_eq!(config.persisted().unwrap().library.import, "k8s.libsonnet");

        config.library.import = "edited.libsonnet".to_string();
        assert_eq!(config.persisted().unwrap().library.import, "edited.libsonnet");
    }

    #[test]
    fn test_app_config_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.library.import, "k8s.libsonnet");
        assert!(config.environments.is_empty());
    }

    #[test]
    fn test_app_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig {
            name: "guestbook".to_string(),
            ..Default::default()
        };
        config.environments.insert(
            "default".to_string(),
            EnvironmentSpec {
                server: Some("https://127.0.0.1:6443".to_string()),
                namespace: Some("default".to_string()),
                context: None,
                targets: vec!["/".to_string()],
            },
        );
        config.save(dir.path()).unwrap();

        let loaded = AppConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.name, "guestbook");
        assert_eq!(loaded.environment("default").unwrap().targets, vec!["/"]);
        assert!(loaded.environment("prod").unwrap_err().is_not_found());
    }

    #[test]
    fn test_partial_file_keeps_nested_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.yaml"), "name: x\nlibrary:\n  import: k.libsonnet\n").unwrap();

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.library.import, "k.libsonnet");
        assert_eq!(config.library.path, PathBuf::from("lib").join("k8s.libsonnet"));
    }
}
