//! Diagnostic pipeline

use std::sync::Arc;

use tracing::warn;

use crate::analyzer::{
    Analyzer, EventAnalyzer, LogAnalyzer, NodeAnalyzer, ProbeAnalyzer, ResourceAnalyzer,
    StatusAnalyzer,
};
use crate::classify::classify_status;
use crate::models::Diagnosis;
use crate::recommend::generate_recommendations;
use crate::source::{SignalSource, SourceError};

/// Runs the full analyzer suite over single pods
pub struct Diagnostician {
    source: Arc<dyn SignalSource>,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Diagnostician {
    /// Create a diagnostician with the default analyzer set
    pub fn new(source: Arc<dyn SignalSource>) -> Self {
        Self {
            source,
            analyzers: vec![
                Box::new(StatusAnalyzer::new()),
                Box::new(EventAnalyzer::new()),
                Box::new(LogAnalyzer::new()),
                Box::new(NodeAnalyzer::new()),
                Box::new(ResourceAnalyzer::new()),
                Box::new(ProbeAnalyzer::new()),
            ],
        }
    }

    /// Diagnose a single pod.
    ///
    /// Fetching the pod itself is the only fatal step. Analyzer failures are
    /// logged and skipped, and events/node health are best-effort: their
    /// absence leaves the corresponding fields empty.
    pub async fn diagnose(&self, namespace: &str, name: &str) -> Result<Diagnosis, SourceError> {
        let pod = self.source.get_pod(namespace, name).await?;

        let mut diagnosis = Diagnosis::new(pod);
        diagnosis.status = classify_status(&diagnosis.pod);

        for analyzer in &self.analyzers {
            match analyzer.analyze(&diagnosis.pod, self.source.as_ref()).await {
                Ok(issues) => diagnosis.issues.extend(issues),
                Err(err) => {
                    warn!(analyzer = analyzer.name(), error = %err, "analyzer failed, continuing");
                }
            }
        }

        if let Ok(events) = self.source.get_pod_events(namespace, name).await {
            diagnosis.events = events;
        }

        if let Some(node) = diagnosis.pod.node.clone() {
            if let Ok(health) = self.source.get_node_health(&node).await {
                diagnosis.node = Some(health);
            }
        }

        diagnosis.recommendations =
            generate_recommendations(&diagnosis.issues, &diagnosis.pod);

        Ok(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        category, NodeHealth, PodStatus, ResourceSpec, Severity,
    };
    use crate::testutil::{
        healthy_container, pod, waiting, with_last_termination, StubSource,
    };

    fn diagnostician(source: StubSource) -> Diagnostician {
        Diagnostician::new(Arc::new(source))
    }

    #[tokio::test]
    async fn missing_pod_is_fatal() {
        let result = diagnostician(StubSource::default())
            .diagnose("default", "ghost")
            .await;
        assert!(matches!(result, Err(SourceError::PodNotFound { .. })));
    }

    #[tokio::test]
    async fn healthy_pod_has_no_issues_or_recommendations() {
        let mut p = pod("web");
        p.containers = vec![healthy_container("app")];
        let mut source = StubSource {
            pod: Some(p),
            node: Some(NodeHealth {
                name: "node-1".to_string(),
                ready: true,
                ..NodeHealth::default()
            }),
            ..StubSource::default()
        };
        source.logs.insert("app".to_string(), "ready\n".to_string());

        let diagnosis = diagnostician(source).diagnose("default", "web").await.unwrap();

        assert_eq!(diagnosis.status, PodStatus::Healthy);
        assert!(diagnosis.issues.is_empty());
        assert!(diagnosis.recommendations.is_empty());
        assert!(diagnosis.is_healthy());
        assert_eq!(diagnosis.node.as_ref().map(|n| n.ready), Some(true));
    }

    #[tokio::test]
    async fn crash_loop_with_oom_produces_the_expected_report() {
        let mut p = pod("web");
        p.containers = vec![with_last_termination(
            waiting("app", "CrashLoopBackOff"),
            "OOMKilled",
            137,
        )];
        let source = StubSource {
            pod: Some(p),
            ..StubSource::default()
        };

        let diagnosis = diagnostician(source).diagnose("default", "web").await.unwrap();

        assert_eq!(diagnosis.status, PodStatus::OomKilled);

        let crash = diagnosis
            .issues
            .iter()
            .find(|i| i.title == "Container app in CrashLoopBackOff")
            .expect("crash loop issue");
        assert_eq!(crash.severity, Severity::Critical);
        assert_eq!(crash.category, category::CONTAINER);

        let oom = diagnosis
            .issues
            .iter()
            .find(|i| i.title == "Container app was OOMKilled")
            .expect("oom issue");
        assert_eq!(oom.severity, Severity::Critical);
        assert_eq!(oom.category, category::RESOURCES);

        let rec_titles: Vec<&str> = diagnosis
            .recommendations
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert!(rec_titles.contains(&"Check container logs"));
        assert!(rec_titles.contains(&"Increase memory limit"));
        let unique: std::collections::HashSet<&&str> = rec_titles.iter().collect();
        assert_eq!(unique.len(), rec_titles.len());
    }

    #[tokio::test]
    async fn best_effort_pod_without_probes_gets_config_recommendations() {
        let mut p = pod("web");
        let mut container = healthy_container("app");
        container.resources = ResourceSpec::default();
        container.liveness = None;
        container.readiness = None;
        p.containers = vec![container];
        let mut source = StubSource {
            pod: Some(p),
            ..StubSource::default()
        };
        source.logs.insert("app".to_string(), "ready\n".to_string());

        let diagnosis = diagnostician(source).diagnose("default", "web").await.unwrap();

        assert!(diagnosis
            .issues
            .iter()
            .any(|i| i.title == "BestEffort QoS for app" && i.severity == Severity::Warning));
        assert!(diagnosis
            .issues
            .iter()
            .any(|i| i.title == "No health probes for app" && i.severity == Severity::Info));

        let configure = diagnosis
            .recommendations
            .iter()
            .position(|r| r.title == "Configure resource requests and limits")
            .expect("configure rec");
        let probes = diagnosis
            .recommendations
            .iter()
            .position(|r| r.title == "Add health probes")
            .expect("probes rec");
        assert_eq!(diagnosis.recommendations[configure].priority, 2);
        assert_eq!(diagnosis.recommendations[probes].priority, 3);
        assert!(configure < probes);
    }

    #[tokio::test]
    async fn enrichment_failures_leave_fields_empty() {
        let mut p = pod("web");
        p.containers = vec![healthy_container("app")];
        let mut source = StubSource {
            pod: Some(p),
            fail_events: true,
            fail_node: true,
            ..StubSource::default()
        };
        source.logs.insert("app".to_string(), "ready\n".to_string());

        let diagnosis = diagnostician(source).diagnose("default", "web").await.unwrap();

        // Event and node analyzers fail, but the remaining analyzers still ran.
        assert!(diagnosis.events.is_empty());
        assert!(diagnosis.node.is_none());
        assert_eq!(diagnosis.status, PodStatus::Healthy);
        assert!(diagnosis.issues.is_empty());
    }

    #[tokio::test]
    async fn diagnosis_is_idempotent_except_for_the_timestamp() {
        let mut p = pod("web");
        p.containers = vec![with_last_termination(
            waiting("app", "CrashLoopBackOff"),
            "OOMKilled",
            137,
        )];
        let source = StubSource {
            pod: Some(p),
            events: vec![crate::testutil::warning_event("BackOff", "restarting")],
            ..StubSource::default()
        };
        let diagnostician = diagnostician(source);

        let first = diagnostician.diagnose("default", "web").await.unwrap();
        let second = diagnostician.diagnose("default", "web").await.unwrap();

        assert_eq!(first.pod, second.pod);
        assert_eq!(first.status, second.status);
        assert_eq!(first.issues, second.issues);
        assert_eq!(first.events, second.events);
        assert_eq!(first.node, second.node);
        assert_eq!(first.recommendations, second.recommendations);
    }
}
