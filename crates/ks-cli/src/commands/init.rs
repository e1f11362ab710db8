//! Create a new app.

use anyhow::{Context, Result};
use colored::Colorize;
use ks_app::App;
use std::path::{Path, PathBuf};

pub async fn execute(name: &str, path: Option<&Path>) -> Result<()> {
    let root = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(name));

    println!("{} app {}", "Creating".green().bold(), name.cyan());

    let app = App::init(&root, name).with_context(|| format!("Failed to create app in {:?}", root))?;

    println!("{} App created at {:?}", "✓".green(), app.root());
    println!("\nNext steps:");
    println!("  cd {}", root.display());
    println!("  ks import -f <manifest.yaml>");
    Ok(())
}
