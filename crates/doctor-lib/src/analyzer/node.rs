//! Node health analysis

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{category, Issue, PodSnapshot, Severity};
use crate::source::SignalSource;

use super::Analyzer;

/// Checks the health of the node running the pod
#[derive(Debug, Default)]
pub struct NodeAnalyzer;

impl NodeAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for NodeAnalyzer {
    fn name(&self) -> &'static str {
        "node"
    }

    async fn analyze(&self, pod: &PodSnapshot, source: &dyn SignalSource) -> Result<Vec<Issue>> {
        // Unscheduled pods have no node to inspect.
        let Some(node_name) = pod.node.as_deref() else {
            return Ok(Vec::new());
        };

        let node = source.get_node_health(node_name).await?;
        let mut issues = Vec::new();

        if !node.ready {
            issues.push(
                Issue::new(
                    Severity::Critical,
                    category::NODE,
                    format!("Node {} is not ready", node.name),
                    "The node where this pod is running is not in Ready state",
                )
                .with_detail("node", &node.name),
            );
        }

        if node.memory_pressure {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::NODE,
                    format!("Node {} has memory pressure", node.name),
                    "The node is experiencing memory pressure, which may cause pod evictions",
                )
                .with_detail("node", &node.name)
                .with_detail("condition", "MemoryPressure"),
            );
        }

        if node.disk_pressure {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::NODE,
                    format!("Node {} has disk pressure", node.name),
                    "The node is running low on disk space",
                )
                .with_detail("node", &node.name)
                .with_detail("condition", "DiskPressure"),
            );
        }

        if node.pid_pressure {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    category::NODE,
                    format!("Node {} has PID pressure", node.name),
                    "The node is running low on process IDs",
                )
                .with_detail("node", &node.name)
                .with_detail("condition", "PIDPressure"),
            );
        }

        if node.network_unavailable {
            issues.push(
                Issue::new(
                    Severity::Critical,
                    category::NODE,
                    format!("Node {} network unavailable", node.name),
                    "The node's network is not properly configured",
                )
                .with_detail("node", &node.name)
                .with_detail("condition", "NetworkUnavailable"),
            );
        }

        Ok(issues)
    }
}
