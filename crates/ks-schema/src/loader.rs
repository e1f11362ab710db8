//! Building a [`SchemaTree`] from a shape document or a live library.

use crate::tree::{SchemaObject, SchemaTree};
use ks_jsonnet::printer::quote;
use ks_types::{ExtVars, KsError, Result, TemplateEvaluator};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// How deep the reflection snippet follows nested objects.
pub const DEFAULT_DEPTH: u32 = 12;

impl SchemaTree {
    /// Build from a shape document:
    /// `{fields: {name: <shape>}, functions: [..], types: [..]}`.
    pub fn from_shape(shape: Value) -> Result<Self> {
        let root: SchemaObject = serde_json::from_value(shape)
            .map_err(|e| KsError::SchemaMismatch(format!("invalid schema shape: {}", e)))?;
        Ok(Self::new(root))
    }

    /// Load a shape document from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = ks_core::util::slurp(path)?;
        let shape: Value = serde_yaml::from_str(&content)
            .map_err(|e| KsError::SchemaMismatch(format!("{:?}: {}", path, e)))?;
        debug!("Loaded schema shape from {:?}", path);
        Self::from_shape(shape)
    }

    /// Reflect a template library's object graph through the evaluator.
    pub fn from_library(evaluator: &dyn TemplateEvaluator, library: impl AsRef<Path>) -> Result<Self> {
        Self::from_library_with_depth(evaluator, library, DEFAULT_DEPTH)
    }

    /// [`SchemaTree::from_library`] with an explicit nesting bound.
    pub fn from_library_with_depth(
        evaluator: &dyn TemplateEvaluator,
        library: impl AsRef<Path>,
        depth: u32,
    ) -> Result<Self> {
        let library = library.as_ref();
        let file_name = library
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| KsError::Config(format!("invalid library path {:?}", library)))?;
        let base_dir = match library.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        info!("Reflecting schema library {:?}", library);
        let output = evaluator.evaluate_snippet(&reflection_snippet(file_name, depth), base_dir, &ExtVars::new())?;
        let shape: Value = serde_json::from_str(&output)?;
        Self::from_shape(shape)
    }
}

/// Snippet that walks an imported library and emits its shape document.
fn reflection_snippet(file_name: &str, depth: u32) -> String {
    format!(
        r#"local lib = import {import};
local isType(name) = std.length(name) > 4 && std.substr(name, std.length(name) - 4, 4) == "Type";
local shape(o, d) =
  local names = std.objectFieldsAll(o);
  {{
    fields: if d <= 0 then {{}} else {{
      [n]: shape(o[n], d - 1)
      for n in names
      if !isType(n) && std.isObject(o[n])
    }},
    functions: [n for n in names if std.isFunction(o[n])],
    types: [n for n in names if isType(n)],
  }};
shape(lib, {depth})
"#,
        import = quote(file_name),
        depth = depth,
    )
}
