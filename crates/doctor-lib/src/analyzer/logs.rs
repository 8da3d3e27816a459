//! Container log analysis

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{category, Issue, PodSnapshot};
use crate::patterns::{scan_text, LogPattern, LOG_PATTERNS};
use crate::source::SignalSource;

use super::Analyzer;

/// Number of log lines fetched per container
const LOG_TAIL_LINES: i64 = 100;

/// Scans container logs for known error patterns
pub struct LogAnalyzer {
    patterns: &'static [LogPattern],
}

impl LogAnalyzer {
    pub fn new() -> Self {
        Self {
            patterns: LOG_PATTERNS.as_slice(),
        }
    }
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for LogAnalyzer {
    fn name(&self) -> &'static str {
        "logs"
    }

    async fn analyze(&self, pod: &PodSnapshot, source: &dyn SignalSource) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        for container in &pod.containers {
            // Fall back to the previous instance's logs when the current
            // fetch fails; a second failure just skips the container.
            let logs = match fetch_logs(source, pod, &container.name, false).await {
                Ok(logs) => logs,
                Err(_) => match fetch_logs(source, pod, &container.name, true).await {
                    Ok(logs) => logs,
                    Err(_) => continue,
                },
            };
            if logs.is_empty() {
                continue;
            }

            for hit in scan_text(self.patterns, &logs) {
                let mut issue = Issue::new(
                    hit.pattern.severity,
                    category::LOGS,
                    format!("[{}] {}", container.name, hit.pattern.title),
                    hit.pattern.description,
                )
                .with_detail("container", &container.name)
                .with_detail("match_count", hit.samples.len().to_string())
                .with_detail("sample_match", &hit.samples[0]);
                if hit.samples.len() > 1 {
                    issue = issue.with_detail(
                        "additional_matches",
                        format!("{} more occurrences", hit.samples.len() - 1),
                    );
                }
                issues.push(issue);
            }
        }

        Ok(issues)
    }
}

async fn fetch_logs(
    source: &dyn SignalSource,
    pod: &PodSnapshot,
    container: &str,
    previous: bool,
) -> Result<String> {
    Ok(source
        .get_pod_logs(&pod.namespace, &pod.name, container, LOG_TAIL_LINES, previous)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::testutil::{healthy_container, pod, StubSource};

    fn web_pod() -> PodSnapshot {
        let mut p = pod("web");
        p.containers = vec![healthy_container("app")];
        p
    }

    #[tokio::test]
    async fn panic_line_yields_one_critical_issue() {
        let mut source = StubSource::default();
        source.logs.insert(
            "app".to_string(),
            "starting\npanic: runtime error: index out of range\n".to_string(),
        );

        let issues = LogAnalyzer::new().analyze(&web_pod(), &source).await.unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].title, "[app] Panic detected");
        assert_eq!(issues[0].details.get("match_count").map(String::as_str), Some("1"));
        assert_eq!(
            issues[0].details.get("sample_match").map(String::as_str),
            Some("panic: runtime error: index out of range")
        );
        assert!(!issues[0].details.contains_key("additional_matches"));
    }

    #[tokio::test]
    async fn repeated_matches_are_counted_once_per_pattern() {
        let mut source = StubSource::default();
        source.logs.insert(
            "app".to_string(),
            "panic: one\npanic: two\npanic: three\n".to_string(),
        );

        let issues = LogAnalyzer::new().analyze(&web_pod(), &source).await.unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].details.get("match_count").map(String::as_str), Some("3"));
        assert_eq!(
            issues[0].details.get("additional_matches").map(String::as_str),
            Some("2 more occurrences")
        );
    }

    #[tokio::test]
    async fn falls_back_to_previous_logs() {
        let mut source = StubSource::default();
        source
            .previous_logs
            .insert("app".to_string(), "fatal error: shutdown\n".to_string());

        let issues = LogAnalyzer::new().analyze(&web_pod(), &source).await.unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "[app] Fatal error");
    }

    #[tokio::test]
    async fn double_fetch_failure_yields_no_issues_and_no_error() {
        let source = StubSource::default();
        let issues = LogAnalyzer::new().analyze(&web_pod(), &source).await.unwrap();
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn clean_logs_yield_no_issues() {
        let mut source = StubSource::default();
        source
            .logs
            .insert("app".to_string(), "listening on :8080\nready\n".to_string());

        let issues = LogAnalyzer::new().analyze(&web_pod(), &source).await.unwrap();
        assert!(issues.is_empty());
    }
}
