//! Render components to stdout.

use super::open_app;
use anyhow::Result;
use ks_app::{actions, Selection};
use ks_types::OutputFormat;
use std::path::Path;

pub async fn execute(dir: Option<&Path>, env: Option<&str>, components: &[String], output: OutputFormat) -> Result<()> {
    let app = open_app(dir)?;
    let selection = Selection {
        env: env.map(String::from),
        components: components.to_vec(),
    };

    let evaluator = app.evaluator();
    let rendered = actions::show(&app, &evaluator, &selection, output)?;
    print!("{}", rendered);
    Ok(())
}
