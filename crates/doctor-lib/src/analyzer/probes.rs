//! Health probe analysis

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    category, ContainerSnapshot, EventRecord, Issue, PodSnapshot, ProbeSpec, Severity,
};
use crate::source::SignalSource;

use super::Analyzer;

/// Checks probe configuration, probe failure events and probe-adjacent
/// container states
#[derive(Debug, Default)]
pub struct ProbeAnalyzer;

impl ProbeAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for ProbeAnalyzer {
    fn name(&self) -> &'static str {
        "probes"
    }

    async fn analyze(&self, pod: &PodSnapshot, source: &dyn SignalSource) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        for container in &pod.containers {
            issues.extend(probe_config_issues(container));
        }

        // Probe failure events are a best-effort enrichment here.
        if let Ok(events) = source.get_pod_events(&pod.namespace, &pod.name).await {
            issues.extend(probe_event_issues(&events));
        }

        for container in &pod.containers {
            issues.extend(probe_status_issues(container));
        }

        Ok(issues)
    }
}

fn probe_config_issues(container: &ContainerSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();

    if container.liveness.is_none() && container.readiness.is_none() {
        issues.push(
            Issue::new(
                Severity::Info,
                category::PROBES,
                format!("No health probes for {}", container.name),
                "Container has no liveness or readiness probes configured",
            )
            .with_detail("container", &container.name)
            .with_detail(
                "recommendation",
                "Consider adding probes for better health monitoring",
            ),
        );
    }

    if let Some(liveness) = &container.liveness {
        issues.extend(liveness_probe_issues(&container.name, liveness));
    }

    if let Some(readiness) = &container.readiness {
        issues.extend(readiness_probe_issues(&container.name, readiness));
    }

    if let Some(startup) = &container.startup {
        issues.extend(startup_probe_issues(&container.name, startup));
    }

    if let (Some(liveness), None) = (&container.liveness, &container.startup) {
        if liveness.initial_delay_seconds < 10 {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::PROBES,
                    format!("Low liveness initialDelaySeconds for {}", container.name),
                    "Liveness probe starts very early, may kill slow-starting containers",
                )
                .with_detail("container", &container.name)
                .with_detail("initial_delay", format!("{}s", liveness.initial_delay_seconds))
                .with_detail(
                    "recommendation",
                    "Consider using a startupProbe or increasing initialDelaySeconds",
                ),
            );
        }
    }

    issues
}

fn liveness_probe_issues(container: &str, probe: &ProbeSpec) -> Vec<Issue> {
    let mut issues = Vec::new();

    if probe.period_seconds > 0 && probe.period_seconds < 5 {
        issues.push(
            Issue::new(
                Severity::Warning,
                category::PROBES,
                format!("Aggressive liveness probe for {}", container),
                "Liveness probe runs very frequently, may cause unnecessary restarts",
            )
            .with_detail("container", container)
            .with_detail("period", format!("{}s", probe.period_seconds))
            .with_detail("recommendation", "Consider increasing periodSeconds to at least 10s"),
        );
    }

    if probe.failure_threshold > 0 && probe.failure_threshold < 3 {
        issues.push(
            Issue::new(
                Severity::Warning,
                category::PROBES,
                format!("Low liveness failureThreshold for {}", container),
                "Container will restart after very few probe failures",
            )
            .with_detail("container", container)
            .with_detail("failure_threshold", probe.failure_threshold.to_string())
            .with_detail("recommendation", "Consider increasing failureThreshold to at least 3"),
        );
    }

    if probe.timeout_seconds > 0 && probe.timeout_seconds < 2 {
        issues.push(
            Issue::new(
                Severity::Info,
                category::PROBES,
                format!("Short liveness timeout for {}", container),
                "Liveness probe timeout is very short",
            )
            .with_detail("container", container)
            .with_detail("timeout", format!("{}s", probe.timeout_seconds))
            .with_detail(
                "recommendation",
                "Consider increasing timeoutSeconds if probe target may be slow",
            ),
        );
    }

    issues
}

fn readiness_probe_issues(container: &str, probe: &ProbeSpec) -> Vec<Issue> {
    let mut issues = Vec::new();

    if probe.initial_delay_seconds > 60 {
        issues.push(
            Issue::new(
                Severity::Info,
                category::PROBES,
                format!("Long readiness initialDelaySeconds for {}", container),
                "Readiness probe starts very late, pod won't receive traffic for a while",
            )
            .with_detail("container", container)
            .with_detail("initial_delay", format!("{}s", probe.initial_delay_seconds)),
        );
    }

    issues
}

fn startup_probe_issues(container: &str, probe: &ProbeSpec) -> Vec<Issue> {
    let mut issues = Vec::new();

    let max_startup_secs = probe.failure_threshold * probe.period_seconds;
    if max_startup_secs > 0 && max_startup_secs < 30 {
        issues.push(
            Issue::new(
                Severity::Warning,
                category::PROBES,
                format!("Short startup window for {}", container),
                "Startup probe allows very little time for container to start",
            )
            .with_detail("container", container)
            .with_detail("max_startup_time", format!("{}s", max_startup_secs))
            .with_detail("recommendation", "Increase failureThreshold or periodSeconds"),
        );
    }

    issues
}

fn probe_event_issues(events: &[EventRecord]) -> Vec<Issue> {
    let mut issues = Vec::new();

    for event in events {
        if event.event_type != "Warning" || event.reason != "Unhealthy" {
            continue;
        }

        // Liveness and startup failures restart the container.
        let (probe_type, severity) = if event.message.contains("Liveness") {
            ("Liveness", Severity::Critical)
        } else if event.message.contains("Readiness") {
            ("Readiness", Severity::Warning)
        } else if event.message.contains("Startup") {
            ("Startup", Severity::Critical)
        } else {
            ("Unknown", Severity::Warning)
        };

        let mut issue = Issue::new(
            severity,
            category::PROBES,
            format!("{} probe failed", probe_type),
            &event.message,
        )
        .with_detail("probe_type", probe_type)
        .with_detail("count", event.count.to_string());
        if let Some(last_seen) = event.last_seen {
            issue = issue.with_detail("last_seen", last_seen.format("%H:%M:%S").to_string());
        }
        issues.push(issue);
    }

    issues
}

fn probe_status_issues(container: &ContainerSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !container.ready && container.state.is_running() {
        issues.push(
            Issue::new(
                Severity::Warning,
                category::PROBES,
                format!("Container {} running but not ready", container.name),
                "Container is running but readiness probe is failing",
            )
            .with_detail("container", &container.name)
            .with_detail("state", "running")
            .with_detail("ready", "false"),
        );
    }

    if container.restart_count > 0 {
        if let Some(term) = &container.last_termination {
            // Exit code 137 is SIGKILL, often from a failing liveness probe.
            if term.exit_code == 137 {
                issues.push(
                    Issue::new(
                        Severity::Warning,
                        category::PROBES,
                        format!("Container {} killed (exit 137)", container.name),
                        "Container was killed with SIGKILL, possibly by liveness probe or OOM",
                    )
                    .with_detail("container", &container.name)
                    .with_detail("exit_code", "137")
                    .with_detail("restart_count", container.restart_count.to_string())
                    .with_detail("reason", &term.reason),
                );
            }
        }
    }

    issues
}
