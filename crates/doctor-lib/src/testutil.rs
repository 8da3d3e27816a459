//! Shared test fixtures: snapshot builders and a stub signal source

use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::models::{
    ContainerSnapshot, ContainerState, EventRecord, NodeHealth, PodPhase, PodSnapshot, ProbeSpec,
    ResourceSpec, TerminationState,
};
use crate::source::{SignalSource, SourceError};

/// A running pod in the default namespace with no containers
pub(crate) fn pod(name: &str) -> PodSnapshot {
    PodSnapshot {
        name: name.to_string(),
        namespace: "default".to_string(),
        node: Some("node-1".to_string()),
        labels: BTreeMap::new(),
        phase: PodPhase::Running,
        reason: None,
        message: None,
        ip: Some("10.0.0.7".to_string()),
        age_seconds: Some(3600),
        deletion_requested: false,
        conditions: Vec::new(),
        containers: Vec::new(),
        init_containers: Vec::new(),
    }
}

fn guaranteed_resources() -> ResourceSpec {
    ResourceSpec {
        cpu_request_millicores: Some(500),
        cpu_limit_millicores: Some(500),
        memory_request_bytes: Some(256 << 20),
        memory_limit_bytes: Some(256 << 20),
    }
}

/// A ready, running container that produces no issues from any analyzer
pub(crate) fn healthy_container(name: &str) -> ContainerSnapshot {
    ContainerSnapshot {
        name: name.to_string(),
        image: format!("registry.example.com/{name}:1.0"),
        ready: true,
        restart_count: 0,
        state: ContainerState::Running { started_at: None },
        last_termination: None,
        resources: guaranteed_resources(),
        liveness: Some(ProbeSpec {
            initial_delay_seconds: 15,
            period_seconds: 10,
            timeout_seconds: 2,
            failure_threshold: 3,
        }),
        readiness: Some(ProbeSpec {
            initial_delay_seconds: 5,
            period_seconds: 10,
            timeout_seconds: 2,
            failure_threshold: 3,
        }),
        startup: None,
    }
}

/// A container stuck waiting with the given reason
pub(crate) fn waiting(name: &str, reason: &str) -> ContainerSnapshot {
    let mut container = healthy_container(name);
    container.ready = false;
    container.state = ContainerState::Waiting {
        reason: reason.to_string(),
        message: String::new(),
    };
    container
}

/// Attach a last-termination record to a container
pub(crate) fn with_last_termination(
    mut container: ContainerSnapshot,
    reason: &str,
    exit_code: i32,
) -> ContainerSnapshot {
    container.last_termination = Some(TerminationState {
        reason: reason.to_string(),
        message: String::new(),
        exit_code,
        finished_at: None,
    });
    container
}

/// A Warning event with a single occurrence
pub(crate) fn warning_event(reason: &str, message: &str) -> EventRecord {
    EventRecord {
        event_type: "Warning".to_string(),
        reason: reason.to_string(),
        message: message.to_string(),
        count: 1,
        first_seen: None,
        last_seen: None,
        source: "kubelet".to_string(),
    }
}

/// Configurable in-memory signal source
#[derive(Default)]
pub(crate) struct StubSource {
    pub pod: Option<PodSnapshot>,
    /// Container name -> current log text
    pub logs: HashMap<String, String>,
    /// Container name -> previous-instance log text
    pub previous_logs: HashMap<String, String>,
    pub events: Vec<EventRecord>,
    pub node: Option<NodeHealth>,
    pub fail_events: bool,
    pub fail_node: bool,
}

#[async_trait]
impl SignalSource for StubSource {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, SourceError> {
        match &self.pod {
            Some(pod) if pod.namespace == namespace && pod.name == name => Ok(pod.clone()),
            _ => Err(SourceError::PodNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn get_pod_logs(
        &self,
        _namespace: &str,
        _name: &str,
        container: &str,
        _tail_lines: i64,
        previous: bool,
    ) -> Result<String, SourceError> {
        let store = if previous { &self.previous_logs } else { &self.logs };
        store
            .get(container)
            .cloned()
            .ok_or_else(|| SourceError::Other(anyhow!("log fetch failed for {container}")))
    }

    async fn get_pod_events(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<Vec<EventRecord>, SourceError> {
        if self.fail_events {
            return Err(SourceError::Other(anyhow!("event listing failed")));
        }
        Ok(self.events.clone())
    }

    async fn get_node_health(&self, node: &str) -> Result<NodeHealth, SourceError> {
        if self.fail_node {
            return Err(SourceError::Other(anyhow!("node fetch failed")));
        }
        self.node
            .clone()
            .ok_or_else(|| SourceError::NodeNotFound(node.to_string()))
    }

    async fn list_pods(
        &self,
        namespace: &str,
        _label_selector: Option<&str>,
    ) -> Result<Vec<PodSnapshot>, SourceError> {
        Ok(self
            .pod
            .iter()
            .filter(|p| p.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn list_all_pods(&self) -> Result<Vec<PodSnapshot>, SourceError> {
        Ok(self.pod.iter().cloned().collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, SourceError> {
        Ok(vec!["default".to_string()])
    }
}
