//! Matching manifest leaves to schema setters.

use crate::descriptor::DESCRIPTOR_DEPTH;
use crate::properties::ManifestTree;
use indexmap::IndexMap;
use ks_schema::{NodeKind, SchemaTree, MIXIN};
use ks_types::{KsError, Result};
use serde_json::Value;
use tracing::{debug, trace};

/// A manifest value bound to the setter that reproduces it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    /// Property keys of the matched manifest prefix (no descriptor)
    pub manifest_path: Vec<String>,
    /// Fully qualified setter path, mixin layers included
    pub setter: Vec<String>,
    /// Manifest value at `manifest_path`
    pub value: Value,
}

impl ResolvedParameter {
    /// Setter function name (`withReplicas`).
    pub fn setter_name(&self) -> &str {
        self.setter.last().map(String::as_str).unwrap_or_default()
    }

    /// Setter path without the function name.
    pub fn namespace(&self) -> &[String] {
        match self.setter.split_last() {
            Some((_, namespace)) => namespace,
            None => &[],
        }
    }

    /// Dotted setter path.
    pub fn qualified_name(&self) -> String {
        self.setter.join(".")
    }

    /// Object path below the kind, without a leading `mixin` layer.
    pub fn lookup_path(&self) -> &[String] {
        let namespace = self.namespace();
        let below_kind = namespace.get(DESCRIPTOR_DEPTH..).unwrap_or(&[]);
        match below_kind.split_first() {
            Some((first, rest)) if first == MIXIN => rest,
            _ => below_kind,
        }
    }
}

/// Resolved parameters keyed by dotted setter path, in resolution order.
pub type Resolved = IndexMap<String, ResolvedParameter>;

/// Single-use resolver; holds the dedup cache of one resolution pass.
pub struct PathResolver<'a> {
    schema: &'a SchemaTree,
    resolved: Resolved,
    skipped: Vec<String>,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver over a schema.
    pub fn new(schema: &'a SchemaTree) -> Self {
        Self {
            schema,
            resolved: IndexMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Resolve every leaf of `manifest`.
    ///
    /// Each leaf tries its full path, then successively shorter prefixes,
    /// until a setter matches. Leaves with no setter at any length are
    /// skipped. Leaves landing on an already resolved setter keep the first
    /// value.
    pub fn resolve(mut self, manifest: &ManifestTree) -> Result<Resolved> {
        for path in manifest.paths() {
            self.resolve_leaf(manifest, path)?;
        }

        if !self.skipped.is_empty() {
            debug!(
                "{}: {} propert{} not expressible as setters: {}",
                manifest.descriptor(),
                self.skipped.len(),
                if self.skipped.len() == 1 { "y" } else { "ies" },
                self.skipped.join(", ")
            );
        }
        Ok(self.resolved)
    }

    fn resolve_leaf(&mut self, manifest: &ManifestTree, path: &[String]) -> Result<()> {
        for end in (DESCRIPTOR_DEPTH + 1..=path.len()).rev() {
            let prefix = &path[..end];
            let found = match self.schema.lookup(prefix) {
                Ok(found) => found,
                Err(KsError::NotFound(_)) | Err(KsError::NotAnObject(_)) => continue,
                Err(e) => return Err(e),
            };
            if found.kind != NodeKind::Setter {
                continue;
            }

            let key = found.dotted();
            if self.resolved.contains_key(&key) {
                trace!("{} already resolved; dropping {}", key, path.join("."));
                return Ok(());
            }

            let manifest_path = prefix[DESCRIPTOR_DEPTH..].to_vec();
            let value = manifest.value(&manifest_path)?.clone();
            let parameter = ResolvedParameter {
                manifest_path,
                setter: found.path,
                value,
            };
            trace!(
                "{} -> {} ({})",
                path.join("."),
                key,
                parameter.lookup_path().join(".")
            );
            self.resolved.insert(key, parameter);
            return Ok(());
        }

        self.skipped.push(path[DESCRIPTOR_DEPTH..].join("."));
        Ok(())
    }
}
