//! # ks Params
//!
//! Component and global parameters kept as template source.
//!
//! A params file has the shape `{global: {...}, components: {<name>: {...}}}`.
//! [`ParamStore`] edits it in place: each change splices only the affected
//! field, and writes are guarded by a [`VersionToken`] so a concurrent writer
//! is reported as a conflict.
//!
//! ```no_run
//! use ks_params::{ParamOptions, ParamStore};
//! use serde_json::json;
//!
//! let store = ParamStore::new("components/params.libsonnet");
//! store.set("guestbook-ui", &["replicas"], &json!(3), ParamOptions::default())?;
//! assert_eq!(store.get("guestbook-ui")?["replicas"], "3");
//! # Ok::<(), ks_types::KsError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod store;
pub mod value;

pub use document::{COMPONENTS, EMPTY_DOCUMENT, GLOBAL};
pub use store::{ParamOptions, ParamStore, VersionToken};
pub use value::{infer, parse_path, NamespaceParameter};
