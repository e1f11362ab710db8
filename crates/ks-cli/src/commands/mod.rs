//! CLI command implementations.

pub mod apply;
pub mod component;
pub mod delete;
pub mod env;
pub mod import;
pub mod init;
pub mod ns;
pub mod param;
pub mod show;
pub mod version;

use anyhow::{Context, Result};
use ks_app::App;
use std::path::Path;
use tracing::debug;

/// The app at `dir`, or the one containing the working directory.
pub fn open_app(dir: Option<&Path>) -> Result<App> {
    match dir {
        Some(dir) => App::open(dir).with_context(|| format!("Failed to open app at {:?}", dir)),
        None => {
            let cwd = std::env::current_dir()?;
            debug!("Looking for an app above {:?}", cwd);
            App::discover(&cwd).context("Not inside a ks app (run 'ks init <name>' first)")
        }
    }
}
