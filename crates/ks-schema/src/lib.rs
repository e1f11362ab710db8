//! # ks Schema
//!
//! The exported object graph of the Kubernetes template library: groups,
//! versions and kinds down to their `withX` setters. Built from a shape
//! document or by reflecting the library through a
//! [`ks_types::TemplateEvaluator`], and queried with [`SchemaTree::lookup`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod loader;
pub mod tree;

pub use tree::{setter_name, Lookup, NodeKind, SchemaObject, SchemaTree, MIXIN};
