//! Importing plain manifests as components.

use crate::app::App;
use crate::namespace::Namespace;
use indexmap::IndexMap;
use ks_core::util::{data::load_yaml_documents, slurp, write_atomic};
use ks_manifest::{Converter, ManifestTree};
use ks_schema::SchemaTree;
use ks_types::{bail, ComponentFormat, ComponentName, KsError, NamespaceName, Result, TemplateEvaluator};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Options of one import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Target namespace
    pub namespace: NamespaceName,
    /// Keep manifests verbatim instead of converting them
    pub raw: bool,
}

/// A component written by an import.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    /// Component name
    pub name: ComponentName,
    /// Written source file
    pub path: PathBuf,
    /// Source format
    pub format: ComponentFormat,
    /// Initial parameters recorded in the namespace params file
    pub params: IndexMap<String, Value>,
}

struct Pending {
    name: ComponentName,
    source: String,
    format: ComponentFormat,
    params: IndexMap<String, Value>,
}

/// Converts manifest files into components of one app.
pub struct Importer<'a> {
    app: &'a App,
    evaluator: &'a dyn TemplateEvaluator,
}

impl<'a> Importer<'a> {
    /// `evaluator` is only used to reflect the schema library when the app
    /// has no pre-exported schema.
    pub fn new(app: &'a App, evaluator: &'a dyn TemplateEvaluator) -> Self {
        Self { app, evaluator }
    }

    /// Import a manifest file, or every manifest under a directory.
    ///
    /// Every document is converted before anything is written; the first
    /// failure aborts the whole batch.
    pub fn import(&self, source: impl AsRef<Path>, options: &ImportOptions) -> Result<Vec<Imported>> {
        let source = source.as_ref();
        let namespace = Namespace::open(self.app, &options.namespace)?;
        let files = manifest_files(source)?;
        if files.is_empty() {
            bail!(NotFound, "no manifests under {:?}", source);
        }

        let schema = if options.raw {
            None
        } else {
            Some(self.app.schema(self.evaluator)?)
        };

        let mut taken: BTreeSet<String> = namespace
            .components()?
            .into_iter()
            .map(|c| c.name.to_string())
            .collect();

        let mut pending = Vec::new();
        for file in &files {
            for item in self.prepare(file, schema.as_ref())? {
                if !taken.insert(item.name.to_string()) {
                    bail!(
                        Validation,
                        "component '{}' already exists in namespace '{}'",
                        item.name,
                        namespace.name()
                    );
                }
                pending.push(item);
            }
        }

        let entries: Vec<(&str, &IndexMap<String, Value>)> =
            pending.iter().map(|item| (item.name.as_str(), &item.params)).collect();
        namespace.params().set_many(&entries)?;

        let mut imported: Vec<Imported> = Vec::with_capacity(pending.len());
        for item in &pending {
            let path = namespace
                .dir()
                .join(format!("{}.{}", item.name, item.format.extension()));
            if let Err(e) = write_atomic(&path, item.source.as_bytes()) {
                roll_back(&namespace, &imported, &entries);
                return Err(e);
            }
            info!("Imported component '{}' to {:?}", item.name, path);
            imported.push(Imported {
                name: item.name.clone(),
                path,
                format: item.format,
                params: item.params.clone(),
            });
        }
        Ok(imported)
    }

    fn prepare(&self, file: &Path, schema: Option<&SchemaTree>) -> Result<Vec<Pending>> {
        let content = slurp(file)?;
        let documents = load_yaml_documents(&content)
            .map_err(|e| KsError::InvalidManifest(format!("{:?}: {}", file, e)))?;
        if documents.is_empty() {
            bail!(InvalidManifest, "{:?} holds no documents", file);
        }

        let stem = ComponentName::from_path(file)?;
        let multiple = documents.len() > 1;
        debug!("{:?} holds {} document(s)", file, documents.len());

        let mut prepared = Vec::with_capacity(documents.len());
        for (index, document) in documents.into_iter().enumerate() {
            let name = if multiple {
                ComponentName::new(format!("{}-{}", stem, index + 1))?
            } else {
                stem.clone()
            };

            let item = match schema {
                None => Pending {
                    source: if multiple { serde_yaml::to_string(&document)? } else { content.clone() },
                    name,
                    format: ComponentFormat::Yaml,
                    params: IndexMap::new(),
                },
                Some(schema) => {
                    let manifest = ManifestTree::new(document)
                        .map_err(|e| KsError::InvalidManifest(format!("{:?}: {}", file, e)))?;
                    let conversion = Converter::new(schema)
                        .with_library_import(self.app.config().library.import.as_str())
                        .convert(name.as_str(), &manifest)?;
                    Pending {
                        name,
                        source: conversion.source,
                        format: ComponentFormat::Jsonnet,
                        params: conversion.params,
                    }
                }
            };
            prepared.push(item);
        }
        Ok(prepared)
    }
}

/// Undo a partly written batch: written files go, and so do the params
/// entries recorded for it.
fn roll_back(namespace: &Namespace, written: &[Imported], entries: &[(&str, &IndexMap<String, Value>)]) {
    for item in written {
        if let Err(e) = std::fs::remove_file(&item.path) {
            warn!("Could not remove {:?}: {}", item.path, e);
        }
    }
    for (component, _) in entries {
        if let Err(e) = namespace.params().remove_component(component) {
            warn!("Could not drop params of '{}': {}", component, e);
        }
    }
}

/// Manifest files at `source`: the file itself, or every `.yaml`, `.yml` and
/// `.json` file below a directory in path order.
fn manifest_files(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if !source.is_dir() {
        bail!(NotFound, "{:?}", source);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| KsError::Io(e.into()))?;
        let is_manifest = matches!(
            entry.path().extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml") | Some("json")
        );
        if entry.file_type().is_file() && is_manifest {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
