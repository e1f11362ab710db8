//! Component namespaces.

use super::open_app;
use crate::cli::NsCommand;
use anyhow::Result;
use colored::Colorize;
use ks_app::Namespace;
use ks_types::NamespaceName;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, command: &NsCommand) -> Result<()> {
    let app = open_app(dir)?;

    match command {
        NsCommand::Create { name } => {
            let namespace = Namespace::create(&app, &NamespaceName::new(name)?)?;
            println!("{} Created namespace {}", "✓".green(), namespace.name().to_string().cyan());
        }
        NsCommand::List => {
            for namespace in Namespace::list(&app)? {
                let count = namespace.components()?.len();
                println!("{:<24} {} component(s)", namespace.name().to_string().cyan(), count);
            }
        }
    }

    Ok(())
}
