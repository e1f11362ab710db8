//! Cluster client backed by the `kubectl` binary.

use async_trait::async_trait;
use ks_core::util::run_async_with_input;
use ks_types::{ApplyOptions, ClientConfig, DeleteOptions, KsError, ObjectClient, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

/// Label carrying the garbage-collection tag of applied objects.
pub const GC_TAG_LABEL: &str = "ks.io/gc-tag";

/// Pipes object lists to `kubectl` on stdin.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
}

impl Kubectl {
    /// Client using `kubectl` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
        }
    }

    /// Use a specific binary.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = path.into();
        self
    }

    fn connection_args(client: &ClientConfig) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(kubeconfig) = &client.kubeconfig {
            args.push(format!("--kubeconfig={}", kubeconfig.display()));
        }
        if let Some(context) = &client.context {
            args.push(format!("--context={}", context));
        }
        if let Some(server) = &client.server {
            args.push(format!("--server={}", server));
        }
        if let Some(namespace) = &client.namespace {
            args.push(format!("--namespace={}", namespace));
        }
        args
    }

    /// Arguments of an apply or create invocation.
    pub fn apply_args(options: &ApplyOptions) -> Vec<String> {
        let verb = if options.create { "create" } else { "apply" };
        let mut args = vec![verb.to_string()];
        args.extend(Self::connection_args(&options.client));
        args.extend(["-f".to_string(), "-".to_string()]);
        if options.dry_run {
            args.push("--dry-run=client".to_string());
        }
        if let (Some(tag), false, false) = (&options.gc_tag, options.skip_gc, options.create) {
            args.push("--prune".to_string());
            args.push(format!("--selector={}={}", GC_TAG_LABEL, tag));
        }
        args
    }

    /// Arguments of a delete invocation.
    pub fn delete_args(options: &DeleteOptions) -> Vec<String> {
        let mut args = vec!["delete".to_string()];
        args.extend(Self::connection_args(&options.client));
        args.extend(["-f".to_string(), "-".to_string(), "--ignore-not-found".to_string()]);
        if let Some(seconds) = options.grace_period {
            args.push(format!("--grace-period={}", seconds));
        }
        args
    }

    async fn execute(&self, args: &[String], objects: &[Value]) -> Result<String> {
        let input = serde_json::to_vec(&list(objects))?;
        debug!("Running {:?} {}", self.binary, args.join(" "));
        let (stdout, code, stderr) = run_async_with_input(&self.binary, args, &input)
            .await
            .map_err(|e| KsError::Client(format!("failed to run {:?}: {}", self.binary, e)))?;
        if code != 0 {
            return Err(KsError::Client(format!(
                "kubectl {} exited with {}: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                code,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new()
    }
}

fn list(objects: &[Value]) -> Value {
    json!({ "apiVersion": "v1", "kind": "List", "items": objects })
}

/// Copies of `objects` labelled with the gc tag.
pub fn tag_objects(objects: &[Value], tag: &str) -> Vec<Value> {
    objects
        .iter()
        .cloned()
        .map(|mut object| {
            if let Some(map) = object.as_object_mut() {
                let metadata = map.entry("metadata").or_insert_with(|| json!({}));
                if let Some(metadata) = metadata.as_object_mut() {
                    let labels = metadata.entry("labels").or_insert_with(|| json!({}));
                    if let Some(labels) = labels.as_object_mut() {
                        labels.insert(GC_TAG_LABEL.to_string(), Value::String(tag.to_string()));
                    }
                }
            }
            object
        })
        .collect()
}

#[async_trait]
impl ObjectClient for Kubectl {
    async fn apply(&self, objects: &[Value], options: &ApplyOptions) -> Result<()> {
        if objects.is_empty() {
            info!("Nothing to apply");
            return Ok(());
        }
        let objects = match &options.gc_tag {
            Some(tag) => tag_objects(objects, tag),
            None => objects.to_vec(),
        };
        let output = self.execute(&Self::apply_args(options), &objects).await?;
        for line in output.lines() {
            info!("{}", line);
        }
        Ok(())
    }

    async fn delete(&self, objects: &[Value], options: &DeleteOptions) -> Result<()> {
        if objects.is_empty() {
            info!("Nothing to delete");
            return Ok(());
        }
        let output = self.execute(&Self::delete_args(options), objects).await?;
        for line in output.lines() {
            info!("{}", line);
        }
        Ok(())
    }
}
