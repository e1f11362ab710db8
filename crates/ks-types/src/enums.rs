//! Common enumerations used throughout ks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use crate::errors::{KsError, Result};

/// Log level enumeration for the logging system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Detailed trace messages
    Trace,
}

impl FromStr for LogLevel {
    type Err = KsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(KsError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Storage format of a component source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentFormat {
    /// Generated or hand-written template source
    Jsonnet,
    /// Plain manifest kept verbatim
    Yaml,
}

impl ComponentFormat {
    /// Classify a file by extension. Returns `None` for files that are not components.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("jsonnet") => Some(ComponentFormat::Jsonnet),
            Some("yaml") | Some("yml") => Some(ComponentFormat::Yaml),
            _ => None,
        }
    }

    /// File extension used when writing a component of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ComponentFormat::Jsonnet => "jsonnet",
            ComponentFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ComponentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Output format for rendered objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-document YAML
    #[default]
    Yaml,
    /// A JSON `List` object
    Json,
}

impl FromStr for OutputFormat {
    type Err = KsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(KsError::Validation(format!("Invalid output format: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_format_from_path() {
        assert_eq!(ComponentFormat::from_path("a/b.jsonnet"), Some(ComponentFormat::Jsonnet));
        assert_eq!(ComponentFormat::from_path("a/b.yml"), Some(ComponentFormat::Yaml));
        assert_eq!(ComponentFormat::from_path("a/params.libsonnet"), None);
        assert_eq!(ComponentFormat::from_path("README"), None);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
