//! # ks Jsonnet
//!
//! Template source handling for ks components and parameter files.
//!
//! - **Parsing**: a lexer and parser that keep the byte span of every node
//! - **Printing**: canonical source for trees built in memory
//! - **Patching**: field set/remove edits that splice only the affected bytes
//! - **Evaluation**: a wrapper around the `jsonnet` binary implementing
//!   [`ks_types::TemplateEvaluator`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod edit;
pub mod evaluator;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod printer;

pub use ast::{Expr, ExprKind, Span};
pub use edit::Document;
pub use evaluator::Jsonnet;
pub use parser::parse;
pub use printer::print;
