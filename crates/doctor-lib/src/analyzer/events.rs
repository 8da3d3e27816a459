//! Kubernetes event analysis

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{category, EventRecord, Issue, PodSnapshot, Severity};
use crate::source::SignalSource;

use super::Analyzer;

/// Event reasons that carry no diagnostic value
const NON_ACTIONABLE_REASONS: [&str; 4] = ["Scheduled", "Pulled", "Created", "Started"];

/// Turns Warning events into categorized issues
#[derive(Debug, Default)]
pub struct EventAnalyzer;

impl EventAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for EventAnalyzer {
    fn name(&self) -> &'static str {
        "events"
    }

    async fn analyze(&self, pod: &PodSnapshot, source: &dyn SignalSource) -> Result<Vec<Issue>> {
        let events = source.get_pod_events(&pod.namespace, &pod.name).await?;

        Ok(events
            .iter()
            .filter(|event| event.event_type == "Warning")
            .filter_map(warning_event_issue)
            .collect())
    }
}

fn warning_event_issue(event: &EventRecord) -> Option<Issue> {
    let severity = match event.reason.as_str() {
        "Failed" | "FailedScheduling" | "FailedMount" | "FailedAttachVolume" | "BackOff" => {
            Severity::Critical
        }
        _ => Severity::Warning,
    };

    let category = if event.reason.contains("Scheduling") {
        category::SCHEDULING
    } else if event.reason.contains("Volume") || event.reason.contains("Mount") {
        category::STORAGE
    } else if event.reason.contains("Probe") || event.reason == "Unhealthy" {
        category::HEALTH
    } else if event.reason.contains("Pull") {
        category::CONTAINER
    } else if event.reason.contains("OOM") {
        category::RESOURCES
    } else {
        category::EVENTS
    };

    if NON_ACTIONABLE_REASONS.contains(&event.reason.as_str()) {
        return None;
    }

    let mut issue = Issue::new(severity, category, &event.reason, &event.message)
        .with_detail("count", format_count(event.count))
        .with_detail("source", &event.source);
    if let Some(last_seen) = event.last_seen {
        issue = issue.with_detail("last_seen", last_seen.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    Some(issue)
}

fn format_count(count: i32) -> String {
    if count <= 1 {
        "1".to_string()
    } else {
        format!("{} times", count)
    }
}
