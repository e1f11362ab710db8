//! Error types for ks operations.

use thiserror::Error;

/// The main error type for ks operations.
///
/// Every core operation returns this error. The CLI is the only layer that
/// turns it into an exit code.
#[derive(Error, Debug)]
pub enum KsError {
    /// A namespace, component, parameter path, or schema path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A manifest is missing type fields or holds an unclassifiable value
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A resolved setter name is structurally malformed
    #[error("Invalid setter namespace: {0}")]
    InvalidSetterNamespace(String),

    /// The schema library does not have the shape the caller expected
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A non-terminal schema path segment resolved to a leaf
    #[error("Not an object: {0}")]
    NotAnObject(String),

    /// Template source could not be rendered
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored document changed between read and write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Template source could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The template evaluator failed
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The apply/delete collaborator failed
    #[error("Client error: {0}")]
    Client(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal bug - should never happen in production
    #[error("Bug detected: {0}\n\nThis is an internal error. Please report it to the ks maintainers.")]
    Bug(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl KsError {
    /// Whether this error means "the thing asked for is not there".
    pub fn is_not_found(&self) -> bool {
        matches!(self, KsError::NotFound(_))
    }
}

/// A specialized Result type for ks operations.
pub type Result<T> = std::result::Result<T, KsError>;

/// Helper macro to create and return a KsError::Bug
///
/// This should be used for conditions that should never occur
/// in normal operation and indicate a bug in ks itself.
///
/// # Example
///
/// ```ignore
/// if some_impossible_condition {
///     bug!("This should never happen: {:?}", condition);
/// }
/// ```
#[macro_export]
macro_rules! bug {
    ($msg:expr) => {
        return Err($crate::KsError::Bug($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::KsError::Bug(format!($fmt, $($arg)*)))
    };
}

/// Helper macro to bail out with a KsError
///
/// This is used for expected error conditions.
///
/// # Example
///
/// ```ignore
/// if !exists {
///     bail!(NotFound, "component {}", name);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::KsError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::KsError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::KsError::Other($msg.to_string()))
    };
}
