//! Signal source boundary
//!
//! The engine consumes cluster state exclusively through [`SignalSource`];
//! the CLI provides a kube-backed implementation and tests provide stubs.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{EventRecord, NodeHealth, PodSnapshot};

/// Errors surfaced by a signal source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("pod {namespace}/{name} not found")]
    PodNotFound { namespace: String, name: String },

    #[error("node {0} not found")]
    NodeNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reference to a pod by namespace and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Read-only provider of pod state, logs, events and node conditions
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Fetch a pod snapshot; `PodNotFound` is fatal for a diagnosis
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, SourceError>;

    /// Fetch up to `tail_lines` of container logs, optionally from the
    /// previous (pre-restart) instance
    async fn get_pod_logs(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        tail_lines: i64,
        previous: bool,
    ) -> Result<String, SourceError>;

    /// Fetch the event history for a pod
    async fn get_pod_events(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<EventRecord>, SourceError>;

    /// Fetch the condition-derived health of a node
    async fn get_node_health(&self, node: &str) -> Result<NodeHealth, SourceError>;

    /// List pods in a namespace, optionally filtered by label selector
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodSnapshot>, SourceError>;

    /// List pods across all namespaces
    async fn list_all_pods(&self) -> Result<Vec<PodSnapshot>, SourceError>;

    /// List namespace names
    async fn list_namespaces(&self) -> Result<Vec<String>, SourceError>;
}
