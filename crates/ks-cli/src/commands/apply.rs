//! Apply components to a cluster.

use super::open_app;
use crate::ui::progress;
use anyhow::{Context, Result};
use colored::Colorize;
use ks_app::{actions, Kubectl, Selection};
use ks_types::ApplyOptions;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, env: &str, components: &[String], options: ApplyOptions) -> Result<()> {
    let app = open_app(dir)?;
    let selection = Selection {
        env: Some(env.to_string()),
        components: components.to_vec(),
    };

    println!("{} components to {}", "Applying".green().bold(), env.cyan());
    if options.dry_run {
        println!("  {} dry run, the cluster is not changed", "!".yellow());
    }

    let evaluator = app.evaluator();
    let spinner = progress::spinner("Rendering and applying objects...");
    let result = actions::apply(&app, &evaluator, &Kubectl::new(), &selection, options).await;
    spinner.finish_and_clear();

    let objects = result.with_context(|| format!("Failed to apply to environment '{}'", env))?;
    println!("{} Applied {} object(s)", "✓".green(), objects.len());
    Ok(())
}
