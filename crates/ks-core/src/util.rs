//! Common utility functions.

pub mod data;
pub mod process;
pub mod fs;

// Re-export commonly used items
pub use data::{deep_merge, flatten, get_path, merge_patch};
pub use process::{run, run_async_with_input, run_with_env};
pub use fs::{content_hash, expand_path, slurp, write_atomic};
