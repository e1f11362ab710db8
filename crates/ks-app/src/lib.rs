//! # ks App
//!
//! The on-disk app and the actions that run over it:
//!
//! - [`App`]: `app.yaml`, `components/`, `environments/` and `lib/`
//! - [`Namespace`] and [`Component`]: directories and the sources inside them
//! - [`Environment`]: declared targets with their own parameter overrides
//! - [`Importer`]: plain manifests turned into components
//! - [`Renderer`] and [`actions`]: components evaluated into objects and
//!   handed to an [`ObjectClient`](ks_types::ObjectClient) such as [`Kubectl`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actions;
pub mod app;
pub mod component;
pub mod environment;
pub mod import;
pub mod kubectl;
pub mod namespace;
pub mod render;

pub use actions::Selection;
pub use app::App;
pub use component::Component;
pub use environment::Environment;
pub use import::{ImportOptions, Imported, Importer};
pub use kubectl::Kubectl;
pub use namespace::Namespace;
pub use render::{ParamsView, Renderer};
