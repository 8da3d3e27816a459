//! Kubernetes-backed signal source
//!
//! Implements the engine's `SignalSource` trait against a live cluster and
//! translates the API objects into the engine's snapshot types.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use doctor_lib::models::{
    ConditionStatus, ContainerSnapshot, ContainerState, EventRecord, NodeHealth, PodCondition,
    PodPhase, PodSnapshot, ProbeSpec, ResourceSpec, TerminationState,
};
use doctor_lib::source::{SignalSource, SourceError};

/// Signal source backed by the Kubernetes API server
pub struct KubeSource {
    client: Client,
}

impl KubeSource {
    /// Connect using an explicit kubeconfig path, or the default resolution
    /// chain (in-cluster config, then $KUBECONFIG, then ~/.kube/config)
    pub async fn new(kubeconfig: Option<&str>) -> Result<Self> {
        let client = match kubeconfig {
            Some(path) => {
                let kubeconfig =
                    Kubeconfig::read_from(path).context("Failed to read kubeconfig")?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .context("Failed to build cluster config")?;
                Client::try_from(config).context("Failed to create Kubernetes client")?
            }
            None => Client::try_default()
                .await
                .context("Failed to create Kubernetes client")?,
        };
        Ok(Self { client })
    }

    fn pods(&self, namespace: &str) -> Api<corev1::Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SignalSource for KubeSource {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, SourceError> {
        match self.pods(namespace).get(name).await {
            Ok(pod) => Ok(pod_snapshot(&pod)),
            Err(err) => Err(map_not_found(err, || SourceError::PodNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })),
        }
    }

    async fn get_pod_logs(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        tail_lines: i64,
        previous: bool,
    ) -> Result<String, SourceError> {
        let params = LogParams {
            container: Some(container.to_string()),
            tail_lines: Some(tail_lines),
            previous,
            ..LogParams::default()
        };
        self.pods(namespace)
            .logs(name, &params)
            .await
            .map_err(|err| SourceError::Other(anyhow::Error::new(err)))
    }

    async fn get_pod_events(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<EventRecord>, SourceError> {
        let events: Api<corev1::Event> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!(
            "involvedObject.name={name},involvedObject.namespace={namespace},involvedObject.kind=Pod"
        );
        let list = events
            .list(&ListParams::default().fields(&selector))
            .await
            .map_err(|err| SourceError::Other(anyhow::Error::new(err)))?;
        Ok(list.items.iter().map(event_record).collect())
    }

    async fn get_node_health(&self, node: &str) -> Result<NodeHealth, SourceError> {
        let nodes: Api<corev1::Node> = Api::all(self.client.clone());
        match nodes.get(node).await {
            Ok(n) => Ok(node_health(node, &n)),
            Err(err) => Err(map_not_found(err, || {
                SourceError::NodeNotFound(node.to_string())
            })),
        }
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodSnapshot>, SourceError> {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        let list = self
            .pods(namespace)
            .list(&params)
            .await
            .map_err(|err| SourceError::Other(anyhow::Error::new(err)))?;
        Ok(list.items.iter().map(pod_snapshot).collect())
    }

    async fn list_all_pods(&self) -> Result<Vec<PodSnapshot>, SourceError> {
        let pods: Api<corev1::Pod> = Api::all(self.client.clone());
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|err| SourceError::Other(anyhow::Error::new(err)))?;
        Ok(list.items.iter().map(pod_snapshot).collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, SourceError> {
        let namespaces: Api<corev1::Namespace> = Api::all(self.client.clone());
        let list = namespaces
            .list(&ListParams::default())
            .await
            .map_err(|err| SourceError::Other(anyhow::Error::new(err)))?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }
}

fn map_not_found(err: kube::Error, not_found: impl FnOnce() -> SourceError) -> SourceError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => not_found(),
        other => SourceError::Other(anyhow::Error::new(other)),
    }
}

/// Translate an API pod into the engine's snapshot
pub(crate) fn pod_snapshot(pod: &corev1::Pod) -> PodSnapshot {
    let metadata = &pod.metadata;
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();

    let statuses = status_index(status.and_then(|s| s.container_statuses.as_deref()));
    let init_statuses = status_index(status.and_then(|s| s.init_container_statuses.as_deref()));

    let containers = spec
        .map(|s| {
            s.containers
                .iter()
                .map(|c| container_snapshot(c, statuses.get(c.name.as_str()).copied()))
                .collect()
        })
        .unwrap_or_default();
    let init_containers = spec
        .and_then(|s| s.init_containers.as_ref())
        .map(|list| {
            list.iter()
                .map(|c| container_snapshot(c, init_statuses.get(c.name.as_str()).copied()))
                .collect()
        })
        .unwrap_or_default();

    PodSnapshot {
        name: metadata.name.clone().unwrap_or_default(),
        namespace: metadata.namespace.clone().unwrap_or_default(),
        node: spec.and_then(|s| s.node_name.clone()),
        labels: metadata.labels.clone().unwrap_or_default(),
        phase: status
            .and_then(|s| s.phase.as_deref())
            .map(PodPhase::from)
            .unwrap_or(PodPhase::Unknown),
        reason: status.and_then(|s| s.reason.clone()),
        message: status.and_then(|s| s.message.clone()),
        ip: status.and_then(|s| s.pod_ip.clone()),
        age_seconds: metadata
            .creation_timestamp
            .as_ref()
            .map(|t| (Utc::now() - t.0).num_seconds()),
        deletion_requested: metadata.deletion_timestamp.is_some(),
        conditions: status
            .and_then(|s| s.conditions.as_ref())
            .map(|list| list.iter().map(pod_condition).collect())
            .unwrap_or_default(),
        containers,
        init_containers,
    }
}

fn status_index(
    statuses: Option<&[corev1::ContainerStatus]>,
) -> HashMap<&str, &corev1::ContainerStatus> {
    statuses
        .map(|list| list.iter().map(|cs| (cs.name.as_str(), cs)).collect())
        .unwrap_or_default()
}

fn container_snapshot(
    container: &corev1::Container,
    status: Option<&corev1::ContainerStatus>,
) -> ContainerSnapshot {
    let (ready, restart_count, state, last_termination) = match status {
        Some(cs) => (
            cs.ready,
            cs.restart_count,
            container_state(cs.state.as_ref()),
            cs.last_state
                .as_ref()
                .and_then(|s| s.terminated.as_ref())
                .map(termination_state),
        ),
        None => (false, 0, ContainerState::Unknown, None),
    };

    ContainerSnapshot {
        name: container.name.clone(),
        image: container.image.clone().unwrap_or_default(),
        ready,
        restart_count,
        state,
        last_termination,
        resources: container
            .resources
            .as_ref()
            .map(resource_spec)
            .unwrap_or_default(),
        liveness: container.liveness_probe.as_ref().map(probe_spec),
        readiness: container.readiness_probe.as_ref().map(probe_spec),
        startup: container.startup_probe.as_ref().map(probe_spec),
    }
}

fn container_state(state: Option<&corev1::ContainerState>) -> ContainerState {
    let Some(state) = state else {
        return ContainerState::Unknown;
    };
    if let Some(running) = &state.running {
        return ContainerState::Running {
            started_at: running.started_at.as_ref().map(|t| t.0),
        };
    }
    if let Some(waiting) = &state.waiting {
        return ContainerState::Waiting {
            reason: waiting.reason.clone().unwrap_or_default(),
            message: waiting.message.clone().unwrap_or_default(),
        };
    }
    if let Some(terminated) = &state.terminated {
        return ContainerState::Terminated(termination_state(terminated));
    }
    ContainerState::Unknown
}

fn termination_state(terminated: &corev1::ContainerStateTerminated) -> TerminationState {
    TerminationState {
        reason: terminated.reason.clone().unwrap_or_default(),
        message: terminated.message.clone().unwrap_or_default(),
        exit_code: terminated.exit_code,
        finished_at: terminated.finished_at.as_ref().map(|t| t.0),
    }
}

fn probe_spec(probe: &corev1::Probe) -> ProbeSpec {
    ProbeSpec {
        initial_delay_seconds: probe.initial_delay_seconds.unwrap_or_default(),
        period_seconds: probe.period_seconds.unwrap_or_default(),
        timeout_seconds: probe.timeout_seconds.unwrap_or_default(),
        failure_threshold: probe.failure_threshold.unwrap_or_default(),
    }
}

fn resource_spec(resources: &corev1::ResourceRequirements) -> ResourceSpec {
    let requests = resources.requests.as_ref();
    let limits = resources.limits.as_ref();
    ResourceSpec {
        cpu_request_millicores: requests
            .and_then(|m| m.get("cpu"))
            .and_then(parse_cpu_millicores),
        cpu_limit_millicores: limits
            .and_then(|m| m.get("cpu"))
            .and_then(parse_cpu_millicores),
        memory_request_bytes: requests
            .and_then(|m| m.get("memory"))
            .and_then(parse_memory_bytes),
        memory_limit_bytes: limits
            .and_then(|m| m.get("memory"))
            .and_then(parse_memory_bytes),
    }
}

fn pod_condition(condition: &corev1::PodCondition) -> PodCondition {
    PodCondition {
        condition_type: condition.type_.clone(),
        status: ConditionStatus::from(condition.status.as_str()),
        reason: condition.reason.clone(),
        message: condition.message.clone(),
    }
}

fn event_record(event: &corev1::Event) -> EventRecord {
    EventRecord {
        event_type: event.type_.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        count: event.count.unwrap_or_default(),
        first_seen: event.first_timestamp.as_ref().map(|t| t.0),
        last_seen: event.last_timestamp.as_ref().map(|t| t.0),
        source: event
            .source
            .as_ref()
            .and_then(|s| s.component.clone())
            .unwrap_or_default(),
    }
}

fn node_health(name: &str, node: &corev1::Node) -> NodeHealth {
    let mut health = NodeHealth {
        name: name.to_string(),
        ..NodeHealth::default()
    };

    let conditions = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref());
    if let Some(conditions) = conditions {
        for condition in conditions {
            let is_true = condition.status == "True";
            match condition.type_.as_str() {
                "Ready" => health.ready = is_true,
                "MemoryPressure" => health.memory_pressure = is_true,
                "DiskPressure" => health.disk_pressure = is_true,
                "PIDPressure" => health.pid_pressure = is_true,
                "NetworkUnavailable" => health.network_unavailable = is_true,
                _ => {}
            }
        }
    }

    health
}

/// Parse a Kubernetes CPU quantity into millicores
fn parse_cpu_millicores(quantity: &Quantity) -> Option<i64> {
    let value = quantity.0.trim();
    if let Some(millicores) = value.strip_suffix('m') {
        millicores.parse::<i64>().ok()
    } else {
        value
            .parse::<f64>()
            .ok()
            .map(|cores| (cores * 1000.0).round() as i64)
    }
}

/// Parse a Kubernetes memory quantity into bytes
fn parse_memory_bytes(quantity: &Quantity) -> Option<i64> {
    const SUFFIXES: [(&str, i64); 12] = [
        ("Ki", 1_i64 << 10),
        ("Mi", 1_i64 << 20),
        ("Gi", 1_i64 << 30),
        ("Ti", 1_i64 << 40),
        ("Pi", 1_i64 << 50),
        ("Ei", 1_i64 << 60),
        ("k", 1_000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
        ("T", 1_000_000_000_000),
        ("P", 1_000_000_000_000_000),
        ("E", 1_000_000_000_000_000_000),
    ];

    let value = quantity.0.trim();
    for (suffix, multiplier) in SUFFIXES {
        if let Some(stripped) = value.strip_suffix(suffix) {
            return stripped
                .parse::<f64>()
                .ok()
                .map(|v| (v * multiplier as f64).round() as i64);
        }
    }
    value.parse::<f64>().ok().map(|v| v.round() as i64)
}
