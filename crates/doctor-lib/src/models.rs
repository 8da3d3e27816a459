//! Core data models for pod diagnosis

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Issue category names
pub mod category {
    pub const CONTAINER: &str = "container";
    pub const RESOURCES: &str = "resources";
    pub const PROBES: &str = "probes";
    pub const SCHEDULING: &str = "scheduling";
    pub const NODE: &str = "node";
    pub const LOGS: &str = "logs";
    pub const EVENTS: &str = "events";
    pub const HEALTH: &str = "health";
    pub const STORAGE: &str = "storage";
}

/// A detected problem with a pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        category: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.to_string(),
            title: title.into(),
            description: description.into(),
            details: BTreeMap::new(),
        }
    }

    /// Add a detail entry, returning the issue for chaining
    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// A suggested fix for one or more issues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Lower values are more urgent
    pub priority: i32,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Recommendation {
    pub fn new(priority: i32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            priority,
            title: title.into(),
            description: description.into(),
            command: None,
        }
    }

    /// Attach a suggested command, returning the recommendation for chaining
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// High-level status of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodStatus {
    Healthy,
    CrashLoopBackOff,
    ImagePullBackOff,
    Pending,
    #[serde(rename = "OOMKilled")]
    OomKilled,
    Evicted,
    Error,
    Terminating,
    NotReady,
    CreateContainerError,
    CreateContainerConfigError,
    Unknown,
}

impl fmt::Display for PodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PodStatus::Healthy => "Healthy",
            PodStatus::CrashLoopBackOff => "CrashLoopBackOff",
            PodStatus::ImagePullBackOff => "ImagePullBackOff",
            PodStatus::Pending => "Pending",
            PodStatus::OomKilled => "OOMKilled",
            PodStatus::Evicted => "Evicted",
            PodStatus::Error => "Error",
            PodStatus::Terminating => "Terminating",
            PodStatus::NotReady => "NotReady",
            PodStatus::CreateContainerError => "CreateContainerError",
            PodStatus::CreateContainerConfigError => "CreateContainerConfigError",
            PodStatus::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Pod lifecycle phase as reported by the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for PodPhase {
    fn from(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Status of a pod condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<&str> for ConditionStatus {
    fn from(status: &str) -> Self {
        match status {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

/// A pod-level condition such as PodScheduled or Ready
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Final state of a terminated container instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationState {
    pub reason: String,
    pub message: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Current state of a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContainerState {
    #[serde(rename_all = "camelCase")]
    Running {
        #[serde(skip_serializing_if = "Option::is_none")]
        started_at: Option<DateTime<Utc>>,
    },
    Waiting {
        reason: String,
        message: String,
    },
    Terminated(TerminationState),
    Unknown,
}

impl ContainerState {
    /// Short state word for display
    pub fn label(&self) -> &'static str {
        match self {
            ContainerState::Running { .. } => "running",
            ContainerState::Waiting { .. } => "waiting",
            ContainerState::Terminated(_) => "terminated",
            ContainerState::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running { .. })
    }
}

/// Health probe configuration; zero values mean the field was not set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    pub initial_delay_seconds: i32,
    pub period_seconds: i32,
    pub timeout_seconds: i32,
    pub failure_threshold: i32,
}

/// Quality-of-service tier derived from requests and limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QosClass {
    Guaranteed,
    Burstable,
    BestEffort,
}

/// Normalized resource requests and limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_request_millicores: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit_millicores: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_request_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_bytes: Option<i64>,
}

impl ResourceSpec {
    pub fn has_requests(&self) -> bool {
        self.cpu_request_millicores.is_some() || self.memory_request_bytes.is_some()
    }

    pub fn has_limits(&self) -> bool {
        self.cpu_limit_millicores.is_some() || self.memory_limit_bytes.is_some()
    }

    /// Derive the QoS class: Guaranteed when requests equal limits for both
    /// CPU and memory, Burstable when anything is set, BestEffort otherwise.
    pub fn qos_class(&self) -> QosClass {
        let guaranteed = self.cpu_limit_millicores.is_some()
            && self.memory_limit_bytes.is_some()
            && self.cpu_request_millicores == self.cpu_limit_millicores
            && self.memory_request_bytes == self.memory_limit_bytes;
        if guaranteed {
            QosClass::Guaranteed
        } else if self.has_requests() || self.has_limits() {
            QosClass::Burstable
        } else {
            QosClass::BestEffort
        }
    }
}

/// Snapshot of one container, merging spec and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSnapshot {
    pub name: String,
    pub image: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: ContainerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_termination: Option<TerminationState>,
    pub resources: ResourceSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness: Option<ProbeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ProbeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup: Option<ProbeSpec>,
}

impl ContainerSnapshot {
    /// Waiting reason and message, if the container is waiting
    pub fn waiting_reason(&self) -> Option<(&str, &str)> {
        match &self.state {
            ContainerState::Waiting { reason, message } => Some((reason, message)),
            _ => None,
        }
    }

    /// Reason from the current state, for display
    pub fn state_reason(&self) -> Option<&str> {
        match &self.state {
            ContainerState::Waiting { reason, .. } => Some(reason.as_str()),
            ContainerState::Terminated(term) => Some(term.reason.as_str()),
            _ => None,
        }
        .filter(|r| !r.is_empty())
    }
}

/// Immutable view of one pod at diagnosis time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub phase: PodPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<i64>,
    pub deletion_requested: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PodCondition>,
    pub containers: Vec<ContainerSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<ContainerSnapshot>,
}

impl PodSnapshot {
    /// Sum of restart counts across app containers
    pub fn total_restarts(&self) -> i32 {
        self.containers.iter().map(|c| c.restart_count).sum()
    }
}

/// A Kubernetes event related to the pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Normal or Warning
    #[serde(rename = "type")]
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    pub source: String,
}

/// Node health derived from node conditions; absent conditions are false
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHealth {
    pub name: String,
    pub ready: bool,
    pub memory_pressure: bool,
    pub disk_pressure: bool,
    pub pid_pressure: bool,
    pub network_unavailable: bool,
}

/// Issue totals by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Complete diagnosis result for a single pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub pod: PodSnapshot,
    pub status: PodStatus,
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeHealth>,
    pub recommendations: Vec<Recommendation>,
    pub diagnosed_at: DateTime<Utc>,
}

impl Diagnosis {
    /// Create an empty diagnosis shell for a pod
    pub fn new(pod: PodSnapshot) -> Self {
        Self {
            pod,
            status: PodStatus::Unknown,
            issues: Vec::new(),
            events: Vec::new(),
            node: None,
            recommendations: Vec::new(),
            diagnosed_at: Utc::now(),
        }
    }

    /// True when no issues were found and the status is Healthy
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty() && self.status == PodStatus::Healthy
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(Issue::is_critical)
    }

    pub fn issue_counts(&self) -> IssueCounts {
        let mut counts = IssueCounts::default();
        for issue in &self.issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }
}
