//! Show version information.

use super::open_app;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, detailed: bool) -> Result<()> {
    println!("{} {}", "ks".cyan().bold(), ks_core::VERSION);

    if detailed {
        println!("\nBuild Information:");
        println!("  Version: {}", env!("CARGO_PKG_VERSION"));
        println!("  Target: {}", std::env::consts::ARCH);
        println!("  OS: {}", std::env::consts::OS);
        println!("  Rust Version: {}", env!("CARGO_PKG_RUST_VERSION"));

        // Outside an app the default jsonnet binary is reported.
        let evaluator = match open_app(dir) {
            Ok(app) => app.evaluator(),
            Err(_) => ks_jsonnet::Jsonnet::new(),
        };
        match evaluator.version() {
            Ok(version) => println!("  Jsonnet: {}", version),
            Err(_) => println!("  Jsonnet: {}", "not found".yellow()),
        }
    }

    Ok(())
}
