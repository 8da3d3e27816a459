//! Resource configuration analysis

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{category, ContainerSnapshot, Issue, PodSnapshot, QosClass, Severity};
use crate::source::SignalSource;

use super::Analyzer;

/// Memory limits below this are likely to OOMKill
const MIN_MEMORY_LIMIT_BYTES: i64 = 64 << 20;

/// CPU limits below this cause severe throttling
const MIN_CPU_LIMIT_MILLICORES: i64 = 50;

/// Checks resource requests, limits and the derived QoS class
#[derive(Debug, Default)]
pub struct ResourceAnalyzer;

impl ResourceAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for ResourceAnalyzer {
    fn name(&self) -> &'static str {
        "resources"
    }

    async fn analyze(&self, pod: &PodSnapshot, _source: &dyn SignalSource) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        for container in &pod.containers {
            issues.extend(container_resource_issues(container));
        }
        for container in &pod.init_containers {
            issues.extend(container_resource_issues(container));
        }

        Ok(issues)
    }
}

fn container_resource_issues(container: &ContainerSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();
    let resources = &container.resources;

    if !resources.has_limits() {
        issues.push(
            Issue::new(
                Severity::Warning,
                category::RESOURCES,
                format!("No resource limits for {}", container.name),
                "Container has no resource limits set, which may lead to resource contention",
            )
            .with_detail("container", &container.name)
            .with_detail(
                "recommendation",
                "Set CPU and memory limits to prevent resource starvation",
            ),
        );
    }

    if !resources.has_requests() {
        issues.push(
            Issue::new(
                Severity::Info,
                category::RESOURCES,
                format!("No resource requests for {}", container.name),
                "Container has no resource requests set, which may affect scheduling",
            )
            .with_detail("container", &container.name)
            .with_detail(
                "recommendation",
                "Set resource requests for better scheduling decisions",
            ),
        );
    }

    if let Some(mem_limit) = resources.memory_limit_bytes {
        if mem_limit < MIN_MEMORY_LIMIT_BYTES {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::RESOURCES,
                    format!("Low memory limit for {}", container.name),
                    "Memory limit is very low and may cause OOMKill",
                )
                .with_detail("container", &container.name)
                .with_detail("memory_limit", format_memory(mem_limit))
                .with_detail("minimum_recommended", "64Mi"),
            );
        }

        if let Some(mem_request) = resources.memory_request_bytes {
            if mem_request > mem_limit {
                issues.push(
                    Issue::new(
                        Severity::Warning,
                        category::RESOURCES,
                        format!("Memory request > limit for {}", container.name),
                        "Memory request exceeds limit, request will be set to limit",
                    )
                    .with_detail("container", &container.name)
                    .with_detail("memory_request", format_memory(mem_request))
                    .with_detail("memory_limit", format_memory(mem_limit)),
                );
            }
        }
    }

    if let Some(cpu_limit) = resources.cpu_limit_millicores {
        if cpu_limit < MIN_CPU_LIMIT_MILLICORES {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::RESOURCES,
                    format!("Very low CPU limit for {}", container.name),
                    "CPU limit is very low and may cause severe throttling",
                )
                .with_detail("container", &container.name)
                .with_detail("cpu_limit", format_cpu(cpu_limit))
                .with_detail("minimum_recommended", "50m"),
            );
        }

        if let Some(cpu_request) = resources.cpu_request_millicores {
            if cpu_request > cpu_limit {
                issues.push(
                    Issue::new(
                        Severity::Warning,
                        category::RESOURCES,
                        format!("CPU request > limit for {}", container.name),
                        "CPU request exceeds limit, request will be set to limit",
                    )
                    .with_detail("container", &container.name)
                    .with_detail("cpu_request", format_cpu(cpu_request))
                    .with_detail("cpu_limit", format_cpu(cpu_limit)),
                );
            }
        }
    }

    if resources.qos_class() == QosClass::BestEffort {
        issues.push(
            Issue::new(
                Severity::Warning,
                category::RESOURCES,
                format!("BestEffort QoS for {}", container.name),
                "Container has BestEffort QoS class and will be first to be evicted under memory pressure",
            )
            .with_detail("container", &container.name)
            .with_detail("qos_class", "BestEffort"),
        );
    }

    issues
}

fn format_memory(bytes: i64) -> String {
    const KI: i64 = 1024;
    const MI: i64 = KI * 1024;
    const GI: i64 = MI * 1024;

    if bytes >= GI && bytes % GI == 0 {
        format!("{}Gi", bytes / GI)
    } else if bytes >= MI && bytes % MI == 0 {
        format!("{}Mi", bytes / MI)
    } else if bytes >= KI && bytes % KI == 0 {
        format!("{}Ki", bytes / KI)
    } else {
        format!("{}", bytes)
    }
}

fn format_cpu(millicores: i64) -> String {
    if millicores % 1000 == 0 {
        format!("{}", millicores / 1000)
    } else {
        format!("{}m", millicores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceSpec;
    use crate::testutil::healthy_container;

    fn with_resources(resources: ResourceSpec) -> ContainerSnapshot {
        let mut container = healthy_container("app");
        container.resources = resources;
        container
    }

    #[test]
    fn guaranteed_container_yields_nothing() {
        assert!(container_resource_issues(&healthy_container("app")).is_empty());
    }

    #[test]
    fn best_effort_container_is_flagged_three_times() {
        let issues = container_resource_issues(&with_resources(ResourceSpec::default()));

        let titles: Vec<&str> = issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "No resource limits for app",
                "No resource requests for app",
                "BestEffort QoS for app",
            ]
        );
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[1].severity, Severity::Info);
        assert_eq!(issues[2].severity, Severity::Warning);
    }

    #[test]
    fn low_memory_limit_is_flagged() {
        let issues = container_resource_issues(&with_resources(ResourceSpec {
            cpu_request_millicores: Some(100),
            cpu_limit_millicores: Some(100),
            memory_request_bytes: Some(32 << 20),
            memory_limit_bytes: Some(32 << 20),
        }));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Low memory limit for app");
        assert_eq!(
            issues[0].details.get("memory_limit").map(String::as_str),
            Some("32Mi")
        );
    }

    #[test]
    fn memory_request_above_limit_is_flagged() {
        let issues = container_resource_issues(&with_resources(ResourceSpec {
            cpu_request_millicores: Some(100),
            cpu_limit_millicores: Some(100),
            memory_request_bytes: Some(512 << 20),
            memory_limit_bytes: Some(256 << 20),
        }));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Memory request > limit for app");
    }

    #[test]
    fn low_cpu_limit_is_flagged() {
        let issues = container_resource_issues(&with_resources(ResourceSpec {
            cpu_request_millicores: Some(10),
            cpu_limit_millicores: Some(10),
            memory_request_bytes: Some(256 << 20),
            memory_limit_bytes: Some(256 << 20),
        }));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Very low CPU limit for app");
        assert_eq!(issues[0].details.get("cpu_limit").map(String::as_str), Some("10m"));
    }

    #[test]
    fn cpu_request_above_limit_is_flagged() {
        let issues = container_resource_issues(&with_resources(ResourceSpec {
            cpu_request_millicores: Some(2000),
            cpu_limit_millicores: Some(1000),
            memory_request_bytes: Some(256 << 20),
            memory_limit_bytes: Some(256 << 20),
        }));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "CPU request > limit for app");
        assert_eq!(issues[0].details.get("cpu_request").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn init_containers_are_checked_too() {
        let mut p = crate::testutil::pod("web");
        p.containers = vec![healthy_container("app")];
        p.init_containers = vec![with_resources(ResourceSpec::default())];

        let issues = ResourceAnalyzer::new()
            .analyze(&p, &crate::testutil::StubSource::default())
            .await
            .unwrap();

        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.category == category::RESOURCES));
    }

    #[test]
    fn memory_formatting_picks_the_largest_exact_unit() {
        assert_eq!(format_memory(64 << 20), "64Mi");
        assert_eq!(format_memory(2 << 30), "2Gi");
        assert_eq!(format_memory(1536), "1536");
        assert_eq!(format_memory(4096), "4Ki");
    }
}
