//! Configuration types shared between the core and its collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to reach a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// kubeconfig context to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Explicit kubeconfig path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
    /// Kubernetes namespace for objects that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// API server URL the environment targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// Options for applying objects to a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOptions {
    /// Create objects instead of updating them
    pub create: bool,
    /// Validate only, change nothing
    pub dry_run: bool,
    /// Label applied objects with this tag and prune others carrying it
    pub gc_tag: Option<String>,
    /// Do not prune objects carrying the gc tag
    pub skip_gc: bool,
    /// Cluster connection
    pub client: ClientConfig,
}

/// Options for deleting objects from a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Seconds to give objects to terminate; `None` uses the server default
    pub grace_period: Option<i64>,
    /// Cluster connection
    pub client: ClientConfig,
}
