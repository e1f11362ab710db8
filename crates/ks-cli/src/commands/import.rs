//! Import manifests as components.

use super::open_app;
use crate::ui::progress;
use anyhow::{Context, Result};
use colored::Colorize;
use ks_app::{ImportOptions, Importer};
use ks_types::NamespaceName;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, file: &Path, namespace: &str, raw: bool) -> Result<()> {
    let app = open_app(dir)?;
    let options = ImportOptions {
        namespace: NamespaceName::new(namespace)?,
        raw,
    };

    let spinner = progress::spinner(&format!("Importing {}", file.display()));
    let evaluator = app.evaluator();
    let result = Importer::new(&app, &evaluator).import(file, &options);
    spinner.finish_and_clear();

    let imported = result.with_context(|| format!("Failed to import {:?}", file))?;
    for component in &imported {
        println!(
            "{} {} ({} params)",
            "✓".green(),
            component.name.as_str().cyan(),
            component.params.len()
        );
    }
    println!(
        "{} {} component(s) into namespace {}",
        "Imported".green().bold(),
        imported.len(),
        options.namespace
    );
    Ok(())
}
