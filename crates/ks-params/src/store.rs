//! A parameter document persisted on disk.

use crate::document::{self, EMPTY_DOCUMENT};
use crate::value::NamespaceParameter;
use indexmap::IndexMap;
use ks_core::util::{content_hash, slurp, write_atomic};
use ks_types::{bail, KsError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identifies the file contents a read observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Token of some file bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(content_hash(bytes))
    }

    /// Token for a file that does not exist yet.
    pub fn missing() -> Self {
        Self(String::new())
    }

    /// Whether this token was taken from an absent file.
    pub fn is_missing(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex digest, empty for a missing file.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            f.write_str("<missing>")
        } else {
            f.write_str(&self.0[..self.0.len().min(12)])
        }
    }
}

/// Options for single-parameter edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamOptions {
    /// Component instance. Only instance 0 exists.
    pub index: usize,
}

impl ParamOptions {
    fn validate(&self) -> Result<()> {
        if self.index != 0 {
            bail!(Validation, "component index {} is out of range, only index 0 exists", self.index);
        }
        Ok(())
    }
}

/// Parameter document at a fixed path.
///
/// Every mutation reads the file with its [`VersionToken`], applies a
/// structural edit to the source and writes it back only if the file still
/// carries the same token.
#[derive(Debug, Clone)]
pub struct ParamStore {
    path: PathBuf,
}

impl ParamStore {
    /// Store backed by `path`. Nothing is read until an operation runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write an empty document unless one already exists.
    pub fn init(&self) -> Result<()> {
        if self.exists() {
            debug!("Params file {:?} already exists", self.path);
            return Ok(());
        }
        self.write(EMPTY_DOCUMENT, &VersionToken::missing())
    }

    /// Current source and its version.
    pub fn read(&self) -> Result<(String, VersionToken)> {
        let source = slurp(&self.path)?;
        let token = VersionToken::of(source.as_bytes());
        Ok((source, token))
    }

    /// Replace the document, failing with `Conflict` if the file no longer
    /// matches `expected`.
    pub fn write(&self, source: &str, expected: &VersionToken) -> Result<()> {
        let current = match slurp(&self.path) {
            Ok(existing) => VersionToken::of(existing.as_bytes()),
            Err(e) if e.is_not_found() => VersionToken::missing(),
            Err(e) => return Err(e),
        };
        if &current != expected {
            bail!(
                Conflict,
                "{:?} changed since it was read (expected {}, found {})",
                self.path,
                expected,
                current
            );
        }
        write_atomic(&self.path, source.as_bytes())?;
        info!("Wrote params {:?}", self.path);
        Ok(())
    }

    /// Parameters of `component`, sorted by key, with values in display form.
    pub fn get(&self, component: &str) -> Result<BTreeMap<String, String>> {
        let (source, _) = self.load()?;
        document::component_params(&source, component)
    }

    /// Global parameters in display form.
    pub fn globals(&self) -> Result<BTreeMap<String, String>> {
        let (source, _) = self.load()?;
        document::global_params(&source)
    }

    /// Every component parameter.
    pub fn list(&self) -> Result<Vec<NamespaceParameter>> {
        let (source, _) = self.load()?;
        document::list(&source)
    }

    /// Set one parameter of `component`, creating its entry if needed.
    pub fn set<S: AsRef<str>>(&self, component: &str, path: &[S], value: &Value, options: ParamOptions) -> Result<()> {
        options.validate()?;
        debug!("Setting {}.{} in {:?}", component, joined(path), self.path);
        self.update(|source| document::set_component_param(source, component, path, value))
    }

    /// Set top-level parameters of several components in one write. Either
    /// every value lands or the file is untouched.
    pub fn set_many(&self, entries: &[(&str, &IndexMap<String, Value>)]) -> Result<()> {
        if entries.iter().all(|(_, values)| values.is_empty()) {
            return Ok(());
        }
        self.update(|source| {
            let mut edited = source.to_string();
            for (component, values) in entries {
                for (key, value) in values.iter() {
                    edited = document::set_component_param(&edited, component, &[key.as_str()], value)?;
                }
            }
            Ok(edited)
        })
    }

    /// Remove one parameter of `component`; `NotFound` if absent.
    pub fn delete<S: AsRef<str>>(&self, component: &str, path: &[S], options: ParamOptions) -> Result<()> {
        options.validate()?;
        debug!("Deleting {}.{} from {:?}", component, joined(path), self.path);
        self.update(|source| document::delete_component_param(source, component, path))
    }

    /// Set a global parameter.
    pub fn set_global<S: AsRef<str>>(&self, path: &[S], value: &Value) -> Result<()> {
        debug!("Setting global {} in {:?}", joined(path), self.path);
        self.update(|source| document::set_global_param(source, path, value))
    }

    /// Remove a global parameter; `NotFound` if absent.
    pub fn delete_global<S: AsRef<str>>(&self, path: &[S]) -> Result<()> {
        self.update(|source| document::delete_global_param(source, path))
    }

    /// Drop every parameter of `component`.
    pub fn remove_component(&self, component: &str) -> Result<()> {
        self.update(|source| document::remove_component(source, component))
    }

    /// Source for reads: a missing file reads as the empty document.
    fn load(&self) -> Result<(String, VersionToken)> {
        match self.read() {
            Ok(found) => Ok(found),
            Err(KsError::NotFound(_)) => Ok((EMPTY_DOCUMENT.to_string(), VersionToken::missing())),
            Err(e) => Err(e),
        }
    }

    fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let (source, token) = self.load()?;
        let edited = edit(&source)?;
        if edited == source && !token.is_missing() {
            return Ok(());
        }
        self.write(&edited, &token)
    }
}

fn joined<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ParamStore {
        ParamStore::new(dir.path().join("components").join("params.libsonnet"))
    }

    #[test]
    fn test_init_writes_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(!store.exists());
        store.init().unwrap();
        assert_eq!(store.read().unwrap().0, EMPTY_DOCUMENT);

        store.set_global(&["namespace"], &json!("default")).unwrap();
        store.init().unwrap();
        assert_eq!(store.globals().unwrap()["namespace"], "\"default\"");
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.read().unwrap_err().is_not_found());
        assert!(store.get("nginx").unwrap().is_empty());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_set_creates_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.set("nginx", &["replicas"], &json!(2), ParamOptions::default()).unwrap();
        assert_eq!(store.get("nginx").unwrap()["replicas"], "2");
    }

    #[test]
    fn test_set_many_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.init().unwrap();

        let mut values = IndexMap::new();
        values.insert("metadataName".to_string(), json!("nginx"));
        values.insert("specReplicas".to_string(), json!(3));
        let mut service = IndexMap::new();
        service.insert("specType".to_string(), json!("ClusterIP"));
        store.set_many(&[("nginx", &values), ("web", &service)]).unwrap();

        let (source, _) = store.read().unwrap();
        let name = source.find("metadataName").unwrap();
        let replicas = source.find("specReplicas").unwrap();
        assert!(name < replicas);
        assert_eq!(store.list().unwrap().len(), 3);
        assert_eq!(store.get("web").unwrap()["specType"], "\"ClusterIP\"");
    }

    #[test]
    fn test_set_many_leaves_unparseable_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(dir.path().join("components")).unwrap();
        std::fs::write(store.path(), "{ global: {").unwrap();

        let mut values = IndexMap::new();
        values.insert("replicas".to_string(), json!(1));
        let err = store.set_many(&[("nginx", &values)]).unwrap_err();
        assert!(matches!(err, KsError::Parse(_)));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ global: {");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.init().unwrap();
        let err = store.delete("nginx", &["replicas"], ParamOptions::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_nonzero_index_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let err = store
            .set("nginx", &["replicas"], &json!(1), ParamOptions { index: 1 })
            .unwrap_err();
        assert!(matches!(err, KsError::Validation(_)));
        assert!(!store.exists());
    }

    #[test]
    fn test_stale_token_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.init().unwrap();

        let (source, token) = store.read().unwrap();
        store.set("redis", &["replicas"], &json!(1), ParamOptions::default()).unwrap();

        let err = store.write(&source, &token).unwrap_err();
        assert!(matches!(err, KsError::Conflict(_)));
        assert_eq!(store.get("redis").unwrap()["replicas"], "1");

        let (_, fresh) = store.read().unwrap();
        store.write(&source, &fresh).unwrap();
        assert!(store.get("redis").unwrap().is_empty());
    }

    #[test]
    fn test_write_to_missing_requires_missing_token() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let stale = VersionToken::of(EMPTY_DOCUMENT.as_bytes());
        assert!(matches!(store.write(EMPTY_DOCUMENT, &stale), Err(KsError::Conflict(_))));
        store.write(EMPTY_DOCUMENT, &VersionToken::missing()).unwrap();
        assert!(store.exists());
    }
}
