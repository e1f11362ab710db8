//! Jsonnet integration for template evaluation.

use ks_core::util::run;
use ks_types::{ExtVars, KsError, Result, TemplateEvaluator};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Jsonnet command executor.
#[derive(Debug, Clone)]
pub struct Jsonnet {
    binary_path: PathBuf,
    jpath: Vec<PathBuf>,
    max_stack: Option<u32>,
}

impl Jsonnet {
    /// Create new executor with the default binary name.
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("jsonnet"),
            jpath: Vec::new(),
            max_stack: None,
        }
    }

    /// Set custom jsonnet binary path.
    pub fn with_binary(mut self, path: impl AsRef<Path>) -> Self {
        self.binary_path = path.as_ref().to_path_buf();
        self
    }

    /// Add a library search path (`-J`).
    pub fn with_jpath(mut self, path: impl AsRef<Path>) -> Self {
        self.jpath.push(path.as_ref().to_path_buf());
        self
    }

    /// Raise the evaluator stack limit, needed when reflecting large libraries.
    pub fn max_stack(mut self, depth: u32) -> Self {
        self.max_stack = Some(depth);
        self
    }

    /// Check if the jsonnet binary is available.
    pub fn check_available(&self) -> bool {
        matches!(run(&self.binary_path, &["--version"]), Ok((_, 0, _)))
    }

    /// Get jsonnet version.
    pub fn version(&self) -> Result<String> {
        let (stdout, code, stderr) = run(&self.binary_path, &["--version"])
            .map_err(|e| KsError::Evaluation(format!("Failed to run jsonnet: {}", e)))?;

        if code != 0 {
            return Err(KsError::Evaluation(format!(
                "Failed to get jsonnet version: {}",
                stderr.trim()
            )));
        }

        Ok(stdout.trim().to_string())
    }

    fn args(&self, vars: &ExtVars, extra_jpath: Option<&Path>) -> Vec<OsString> {
        let mut args = Vec::new();

        if let Some(depth) = self.max_stack {
            args.push(OsString::from("--max-stack"));
            args.push(OsString::from(depth.to_string()));
        }

        for path in self.jpath.iter().map(PathBuf::as_path).chain(extra_jpath) {
            args.push(OsString::from("-J"));
            args.push(path.as_os_str().to_os_string());
        }

        for (key, value) in &vars.strs {
            args.push(OsString::from("--ext-str"));
            args.push(OsString::from(format!("{}={}", key, value)));
        }

        for (key, code) in &vars.code {
            args.push(OsString::from("--ext-code"));
            args.push(OsString::from(format!("{}={}", key, code)));
        }

        args
    }

    fn execute(&self, args: Vec<OsString>, what: &str) -> Result<String> {
        trace!("jsonnet {:?}", args);

        let (stdout, code, stderr) = run(&self.binary_path, &args)
            .map_err(|e| KsError::Evaluation(format!("Failed to run jsonnet: {}", e)))?;

        if code != 0 {
            return Err(KsError::Evaluation(format!(
                "Evaluating {} failed:\n{}",
                what,
                stderr.trim_end()
            )));
        }

        debug!("jsonnet produced {} bytes for {}", stdout.len(), what);
        Ok(stdout)
    }
}

impl Default for Jsonnet {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEvaluator for Jsonnet {
    fn evaluate_file(&self, path: &Path, vars: &ExtVars) -> Result<String> {
        debug!("Evaluating {:?} with jsonnet", path);

        let mut args = self.args(vars, None);
        args.push(path.as_os_str().to_os_string());
        self.execute(args, &path.display().to_string())
    }

    fn evaluate_snippet(&self, source: &str, base_dir: &Path, vars: &ExtVars) -> Result<String> {
        debug!("Evaluating {} byte snippet relative to {:?}", source.len(), base_dir);

        let mut args = self.args(vars, Some(base_dir));
        args.push(OsString::from("-e"));
        args.push(OsString::from(source));
        self.execute(args, "snippet")
    }
}
