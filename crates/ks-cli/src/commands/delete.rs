//! Delete components from a cluster.

use super::open_app;
use crate::ui::progress;
use anyhow::{Context, Result};
use colored::Colorize;
use ks_app::{actions, Kubectl, Selection};
use ks_types::DeleteOptions;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, env: &str, components: &[String], options: DeleteOptions) -> Result<()> {
    let app = open_app(dir)?;
    let selection = Selection {
        env: Some(env.to_string()),
        components: components.to_vec(),
    };

    println!("{} components from {}", "Deleting".red().bold(), env.cyan());

    let evaluator = app.evaluator();
    let spinner = progress::spinner("Deleting objects...");
    let result = actions::delete(&app, &evaluator, &Kubectl::new(), &selection, options).await;
    spinner.finish_and_clear();

    let objects = result.with_context(|| format!("Failed to delete from environment '{}'", env))?;
    println!("{} Deleted {} object(s)", "✓".green(), objects.len());
    Ok(())
}
