//! List and remove components.

use super::open_app;
use crate::cli::ComponentCommand;
use anyhow::Result;
use colored::Colorize;
use ks_app::Namespace;
use ks_types::NamespaceName;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, command: &ComponentCommand) -> Result<()> {
    let app = open_app(dir)?;

    match command {
        ComponentCommand::List { namespace } => {
            let namespaces = match namespace {
                Some(name) => vec![Namespace::open(&app, &NamespaceName::new(name)?)?],
                None => Namespace::list(&app)?,
            };

            let mut found_any = false;
            for namespace in namespaces {
                for component in namespace.components()? {
                    found_any = true;
                    println!("{} ({:?})", component.qualified_name().cyan(), component.format);
                }
            }
            if !found_any {
                println!("  {} No components found", "!".yellow());
            }
        }
        ComponentCommand::Rm { name, namespace } => {
            let namespace = Namespace::open(&app, &NamespaceName::new(namespace)?)?;
            let removed = namespace.remove_component(name)?;
            println!("{} Removed {}", "✓".green(), removed.qualified_name().cyan());
        }
    }

    Ok(())
}
