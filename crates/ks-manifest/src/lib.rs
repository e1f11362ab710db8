//! # ks Manifest
//!
//! Conversion of plain Kubernetes manifests into parameterised components:
//!
//! - [`TypeDescriptor`]: group/version/kind of a manifest, with library aliases
//! - [`ManifestTree`]: the property tree and its sorted leaf paths
//! - [`PathResolver`]: leaf paths matched to schema setters
//! - [`ConstructorBuilder`]: setters grouped into chained calls
//! - [`ComponentEmitter`]: the final component source
//! - [`Converter`]: the whole pipeline for one manifest

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constructor;
pub mod convert;
pub mod descriptor;
pub mod emitter;
pub mod properties;
pub mod resolver;

pub use constructor::{ConstructorBuilder, ConstructorGroup, Groups, SetterCall};
pub use convert::{Conversion, Converter, DEFAULT_LIBRARY_IMPORT};
pub use descriptor::TypeDescriptor;
pub use emitter::{ComponentEmitter, Import, PARAMS_EXT_VAR};
pub use properties::{ManifestTree, PropertyPath};
pub use resolver::{PathResolver, Resolved, ResolvedParameter};
