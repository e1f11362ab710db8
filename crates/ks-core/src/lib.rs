//! # ks Core
//!
//! Core utilities, configuration management, logging, and common functionality
//! for the ks component manager.
//!
//! This crate provides:
//!
//! - **Configuration**: Layered `app.yaml` configuration (defaults, file, environment)
//! - **Logging**: `tracing` subscriber initialisation with env-filter support
//! - **Process Execution**: Command execution with environment and stdin
//! - **File Operations**: Atomic writes, content hashing, path helpers
//! - **Data Structures**: Deep merging, JSON merge patch, flattening

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod log;
pub mod util;

// Re-export commonly used items
pub use config::{AppConfig, Config, EnvironmentSpec, JsonnetConfig, LibraryConfig};
pub use ks_types::{KsError, Result};

/// ks application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ks application name
pub const APP_NAME: &str = "ks";

/// Name of the app configuration file at the app root
pub const APP_FILE: &str = "app.yaml";
