//! Deployment environments.

use super::open_app;
use crate::cli::EnvCommand;
use anyhow::Result;
use colored::Colorize;
use ks_app::Environment;
use ks_core::EnvironmentSpec;
use ks_types::{EnvName, NamespaceName};
use std::path::Path;

pub async fn execute(dir: Option<&Path>, command: &EnvCommand) -> Result<()> {
    let mut app = open_app(dir)?;

    match command {
        EnvCommand::Add {
            name,
            server,
            namespace,
            context,
        } => {
            let spec = EnvironmentSpec {
                server: server.clone(),
                namespace: namespace.clone(),
                context: context.clone(),
                ..Default::default()
            };
            let env = Environment::add(&mut app, &EnvName::new(name)?, spec)?;
            println!("{} Added environment {}", "✓".green(), env.name.as_str().cyan());
        }
        EnvCommand::List => {
            let envs = Environment::list(&app)?;
            if envs.is_empty() {
                println!("  {} No environments found", "!".yellow());
            }
            for env in envs {
                println!(
                    "{:<16} {:<32} {}",
                    env.name.as_str().cyan(),
                    env.spec.server.as_deref().unwrap_or("-"),
                    env.spec.namespace.as_deref().unwrap_or("-")
                );
            }
        }
        EnvCommand::Describe { name } => {
            let env = Environment::open(&app, name)?;
            println!("{}:", env.name.as_str().cyan().bold());
            println!("  Server:    {}", env.spec.server.as_deref().unwrap_or("-"));
            println!("  Namespace: {}", env.spec.namespace.as_deref().unwrap_or("-"));
            println!("  Context:   {}", env.spec.context.as_deref().unwrap_or("-"));
            match env.targets()? {
                Some(targets) => {
                    let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                    println!("  Targets:   {}", targets.join(", "));
                }
                None => println!("  Targets:   (all namespaces)"),
            }

            let params = env.params().list()?;
            if !params.is_empty() {
                println!("  Overrides:");
                for row in params {
                    let owner = if row.component.is_empty() { "global" } else { row.component.as_str() };
                    println!("    {}.{} = {}", owner, row.key, row.value);
                }
            }
        }
        EnvCommand::Targets { name, namespaces } => {
            let targets = namespaces
                .iter()
                .map(NamespaceName::new)
                .collect::<ks_types::Result<Vec<_>>>()?;
            Environment::set_targets(&mut app, name, &targets)?;
            println!("{} Updated targets of {}", "✓".green(), name.cyan());
        }
    }

    Ok(())
}
