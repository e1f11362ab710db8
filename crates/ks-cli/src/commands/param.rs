//! Read and edit component parameters.

use super::open_app;
use crate::cli::{ParamCommand, ParamTarget};
use anyhow::Result;
use colored::Colorize;
use ks_app::{App, Environment};
use ks_params::{infer, parse_path, ParamOptions, ParamStore};
use ks_types::NamespaceName;
use std::path::Path;

/// The namespace params file, or an environment's overrides when `--env` is given.
fn store(app: &App, target: &ParamTarget) -> Result<ParamStore> {
    match &target.env {
        Some(env) => Ok(Environment::open(app, env)?.params().clone()),
        None => {
            let namespace = NamespaceName::new(&target.namespace)?;
            let store = app.namespace_params(&namespace);
            if !store.exists() {
                anyhow::bail!("namespace '{}' does not exist", namespace);
            }
            Ok(store)
        }
    }
}

pub async fn execute(dir: Option<&Path>, command: &ParamCommand) -> Result<()> {
    let app = open_app(dir)?;

    match command {
        ParamCommand::Set {
            component,
            path,
            value,
            target,
            index,
        } => {
            let value = infer(value);
            store(&app, target)?.set(component, &parse_path(path), &value, ParamOptions { index: *index })?;
            println!("{} {}.{} = {}", "✓".green(), component.cyan(), path, value);
        }
        ParamCommand::Delete {
            component,
            path,
            target,
            index,
        } => {
            store(&app, target)?.delete(component, &parse_path(path), ParamOptions { index: *index })?;
            println!("{} Removed {}.{}", "✓".green(), component.cyan(), path);
        }
        ParamCommand::List { component, target } => {
            let store = store(&app, target)?;
            match component {
                Some(component) => {
                    let params = store.get(component)?;
                    if params.is_empty() {
                        println!("  {} No parameters for {}", "!".yellow(), component);
                    }
                    for (key, value) in params {
                        println!("{:<24} {}", key.cyan(), value);
                    }
                }
                None => {
                    let rows = store.list()?;
                    if rows.is_empty() {
                        println!("  {} No parameters", "!".yellow());
                        return Ok(());
                    }
                    let width = rows.iter().map(|r| r.component.len()).max().unwrap_or(0).max(9);
                    println!("{:<width$} {:<20} {}", "COMPONENT".bold(), "PARAM".bold(), "VALUE".bold());
                    for row in rows {
                        println!("{:<width$} {:<20} {}", row.component, row.key, row.value);
                    }
                }
            }
        }
        ParamCommand::SetGlobal { path, value, target } => {
            let value = infer(value);
            store(&app, target)?.set_global(&parse_path(path), &value)?;
            println!("{} global {} = {}", "✓".green(), path.cyan(), value);
        }
        ParamCommand::DeleteGlobal { path, target } => {
            store(&app, target)?.delete_global(&parse_path(path))?;
            println!("{} Removed global {}", "✓".green(), path.cyan());
        }
    }

    Ok(())
}
