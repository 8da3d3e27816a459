//! Container and pod status analysis

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    category, ConditionStatus, ContainerSnapshot, ContainerState, Issue, PodPhase, PodSnapshot,
    Severity,
};
use crate::source::SignalSource;

use super::Analyzer;

/// Restart counts above this are flagged
const RESTART_WARNING_THRESHOLD: i32 = 5;

/// Waiting reasons that are part of normal startup
const TRANSIENT_WAITING_REASONS: [&str; 2] = ["ContainerCreating", "PodInitializing"];

/// Analyzes container states, pod conditions and restart counts
#[derive(Debug, Default)]
pub struct StatusAnalyzer;

impl StatusAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for StatusAnalyzer {
    fn name(&self) -> &'static str {
        "status"
    }

    async fn analyze(&self, pod: &PodSnapshot, _source: &dyn SignalSource) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        for container in &pod.containers {
            issues.extend(container_status_issues(container));
        }

        for container in &pod.init_containers {
            issues.extend(init_container_issues(container));
        }

        issues.extend(condition_issues(pod));

        for container in &pod.containers {
            if container.restart_count > RESTART_WARNING_THRESHOLD {
                issues.push(
                    Issue::new(
                        Severity::Warning,
                        category::CONTAINER,
                        format!("High restart count for {}", container.name),
                        format!("Container has restarted {} times", container.restart_count),
                    )
                    .with_detail("container", &container.name)
                    .with_detail("restart_count", container.restart_count.to_string()),
                );
            }
        }

        Ok(issues)
    }
}

fn container_status_issues(container: &ContainerSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some((reason, message)) = container.waiting_reason() {
        match reason {
            "CrashLoopBackOff" => issues.push(
                Issue::new(
                    Severity::Critical,
                    category::CONTAINER,
                    format!("Container {} in CrashLoopBackOff", container.name),
                    "Container is repeatedly crashing after starting",
                )
                .with_detail("container", &container.name)
                .with_detail("reason", reason)
                .with_detail("message", message)
                .with_detail("restart_count", container.restart_count.to_string()),
            ),
            "ImagePullBackOff" | "ErrImagePull" => issues.push(
                Issue::new(
                    Severity::Critical,
                    category::CONTAINER,
                    format!("Cannot pull image for {}", container.name),
                    message,
                )
                .with_detail("container", &container.name)
                .with_detail("reason", reason)
                .with_detail("image", &container.image),
            ),
            "CreateContainerConfigError" => issues.push(
                Issue::new(
                    Severity::Critical,
                    category::CONTAINER,
                    format!("Config error for {}", container.name),
                    message,
                )
                .with_detail("container", &container.name)
                .with_detail("reason", reason),
            ),
            "CreateContainerError" => issues.push(
                Issue::new(
                    Severity::Critical,
                    category::CONTAINER,
                    format!("Cannot create container {}", container.name),
                    message,
                )
                .with_detail("container", &container.name)
                .with_detail("reason", reason),
            ),
            _ => {
                if !reason.is_empty() && !TRANSIENT_WAITING_REASONS.contains(&reason) {
                    issues.push(
                        Issue::new(
                            Severity::Warning,
                            category::CONTAINER,
                            format!("Container {} waiting: {}", container.name, reason),
                            message,
                        )
                        .with_detail("container", &container.name)
                        .with_detail("reason", reason),
                    );
                }
            }
        }
    }

    if let Some(term) = &container.last_termination {
        if term.reason == "OOMKilled" {
            issues.push(
                Issue::new(
                    Severity::Critical,
                    category::RESOURCES,
                    format!("Container {} was OOMKilled", container.name),
                    "Container exceeded memory limit and was killed",
                )
                .with_detail("container", &container.name)
                .with_detail("reason", "OOMKilled")
                .with_detail("exit_code", term.exit_code.to_string()),
            );
        } else if term.exit_code != 0 {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::CONTAINER,
                    format!(
                        "Container {} exited with code {}",
                        container.name, term.exit_code
                    ),
                    &term.message,
                )
                .with_detail("container", &container.name)
                .with_detail("reason", &term.reason)
                .with_detail("exit_code", term.exit_code.to_string()),
            );
        }
    }

    if let ContainerState::Terminated(term) = &container.state {
        if term.exit_code != 0 {
            issues.push(
                Issue::new(
                    Severity::Critical,
                    category::CONTAINER,
                    format!(
                        "Container {} terminated with exit code {}",
                        container.name, term.exit_code
                    ),
                    &term.message,
                )
                .with_detail("container", &container.name)
                .with_detail("reason", &term.reason)
                .with_detail("exit_code", term.exit_code.to_string()),
            );
        }
    }

    issues
}

fn init_container_issues(container: &ContainerSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some((reason, message)) = container.waiting_reason() {
        if !reason.is_empty() {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::CONTAINER,
                    format!("Init container {} waiting: {}", container.name, reason),
                    message,
                )
                .with_detail("container", &container.name)
                .with_detail("type", "init")
                .with_detail("reason", reason),
            );
        }
    }

    if let ContainerState::Terminated(term) = &container.state {
        if term.exit_code != 0 {
            issues.push(
                Issue::new(
                    Severity::Critical,
                    category::CONTAINER,
                    format!("Init container {} failed", container.name),
                    format!("Exit code: {} - {}", term.exit_code, term.message),
                )
                .with_detail("container", &container.name)
                .with_detail("type", "init")
                .with_detail("exit_code", term.exit_code.to_string()),
            );
        }
    }

    issues
}

fn condition_issues(pod: &PodSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();

    for cond in &pod.conditions {
        let message = cond.message.clone().unwrap_or_default();
        let reason = cond.reason.clone().unwrap_or_default();
        match cond.condition_type.as_str() {
            "PodScheduled" => {
                if cond.status == ConditionStatus::False {
                    issues.push(
                        Issue::new(
                            Severity::Critical,
                            category::SCHEDULING,
                            "Pod cannot be scheduled",
                            message,
                        )
                        .with_detail("reason", reason),
                    );
                }
            }
            "Ready" => {
                if cond.status == ConditionStatus::False && pod.phase == PodPhase::Running {
                    issues.push(
                        Issue::new(
                            Severity::Warning,
                            category::CONTAINER,
                            "Pod is not ready",
                            message,
                        )
                        .with_detail("reason", reason),
                    );
                }
            }
            "ContainersReady" => {
                if cond.status == ConditionStatus::False && pod.phase == PodPhase::Running {
                    issues.push(
                        Issue::new(
                            Severity::Warning,
                            category::CONTAINER,
                            "Containers not ready",
                            message,
                        )
                        .with_detail("reason", reason),
                    );
                }
            }
            _ => {}
        }
    }

    if pod.phase == PodPhase::Failed && pod.reason.as_deref() == Some("Evicted") {
        issues.push(
            Issue::new(
                Severity::Critical,
                category::RESOURCES,
                "Pod was evicted",
                pod.message.clone().unwrap_or_default(),
            )
            .with_detail("reason", "Evicted"),
        );
    }

    issues
}
