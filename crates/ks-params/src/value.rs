//! Parameter values and their display form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One flattened parameter row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceParameter {
    /// Component name, empty for global parameters
    pub component: String,
    /// Instance index, always 0
    pub index: usize,
    /// Top-level parameter key
    pub key: String,
    /// Value as template literal text
    pub value: String,
}

impl fmt::Display for NamespaceParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {}", self.component, self.key, self.value)
    }
}

/// Interpret a command-line value: JSON numbers, booleans, null, arrays,
/// objects and quoted strings keep their type; anything else is a string.
pub fn infer(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Split a dotted parameter path.
pub fn parse_path(path: &str) -> Vec<String> {
    path.split('.').filter(|s| !s.is_empty()).map(String::from).collect()
}
