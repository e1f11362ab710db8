//! Core trait definitions for the external collaborators of ks.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use crate::config::{ApplyOptions, DeleteOptions};
use crate::errors::Result;

/// External variables injected into a template evaluation.
///
/// `strs` are bound as plain strings, `code` as template source (usually JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtVars {
    /// Variables bound as strings
    pub strs: BTreeMap<String, String>,
    /// Variables bound as template code
    pub code: BTreeMap<String, String>,
}

impl ExtVars {
    /// Create an empty set of external variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a string variable.
    pub fn with_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strs.insert(key.into(), value.into());
        self
    }

    /// Bind a code variable.
    pub fn with_code(mut self, key: impl Into<String>, code: impl Into<String>) -> Self {
        self.code.insert(key.into(), code.into());
        self
    }
}

/// Trait for template evaluators.
///
/// Implementers turn template source plus external variables into JSON text.
pub trait TemplateEvaluator: Send + Sync {
    /// Evaluate a template file. Imports resolve relative to the file.
    fn evaluate_file(&self, path: &Path, vars: &ExtVars) -> Result<String>;

    /// Evaluate in-memory source. Imports resolve against `base_dir`.
    fn evaluate_snippet(&self, source: &str, base_dir: &Path, vars: &ExtVars) -> Result<String>;
}

/// Trait for the cluster apply/delete collaborator.
///
/// Implementers own all cluster I/O, retries, and garbage collection by tag.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Create or update the given objects.
    async fn apply(&self, objects: &[Value], options: &ApplyOptions) -> Result<()>;

    /// Delete the given objects.
    async fn delete(&self, objects: &[Value], options: &DeleteOptions) -> Result<()>;
}
