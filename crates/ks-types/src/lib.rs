//! # ks Types
//!
//! Core types, traits, and enums shared across all ks crates.
//!
//! This crate provides the fundamental building blocks for the ks component
//! manager, including:
//!
//! - Type-safe wrappers for namespace, component, and environment names
//! - Common enums for log levels, component formats, and output formats
//! - The seam traits for the template evaluator and the cluster client
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use ks_types::{ComponentName, NamespaceName};
//!
//! let component = ComponentName::new("guestbook-ui").unwrap();
//! assert_eq!(component.as_str(), "guestbook-ui");
//!
//! let ns = NamespaceName::new("apps/frontend").unwrap();
//! assert_eq!(ns.segments(), vec!["apps", "frontend"]);
//! assert!(NamespaceName::root().is_root());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod enums;
pub mod traits;
pub mod config;

// Re-export common types for convenience
pub use errors::{KsError, Result};
pub use identifiers::{ComponentName, EnvName, NamespaceName};
pub use enums::{ComponentFormat, LogLevel, OutputFormat};
pub use traits::{ExtVars, ObjectClient, TemplateEvaluator};
pub use config::{ApplyOptions, ClientConfig, DeleteOptions};
