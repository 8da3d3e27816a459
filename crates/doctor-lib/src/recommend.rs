//! Recommendation synthesis
//!
//! Every issue-to-recommendation coupling lives in one static rule table,
//! keyed by issue category plus a trigger: an exact reason match (against
//! `details["reason"]` or the title), a title substring, or unconditional.
//! Titles are deduplicated first-seen-wins and the result is stable-sorted
//! by ascending priority.

use std::collections::HashSet;

use crate::models::{category, Issue, PodSnapshot, Recommendation};

type CommandFn = fn(&PodSnapshot) -> String;

enum Trigger {
    Always,
    ReasonIs(&'static str),
    TitleContains(&'static str),
}

impl Trigger {
    fn matches(&self, issue: &Issue) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::ReasonIs(reason) => {
                issue.details.get("reason").map(String::as_str) == Some(*reason)
                    || issue.title == *reason
            }
            Trigger::TitleContains(needle) => issue.title.contains(needle),
        }
    }
}

struct RecRule {
    category: &'static str,
    trigger: Trigger,
    priority: i32,
    title: &'static str,
    description: &'static str,
    command: Option<CommandFn>,
}

fn cmd_previous_logs(pod: &PodSnapshot) -> String {
    format!("kubectl logs {} -n {} --previous", pod.name, pod.namespace)
}

fn cmd_describe_pod(pod: &PodSnapshot) -> String {
    format!("kubectl describe pod {} -n {}", pod.name, pod.namespace)
}

fn cmd_set_memory_limit(_pod: &PodSnapshot) -> String {
    "kubectl set resources deployment/<deployment-name> -c <container> --limits=memory=<new-limit>"
        .to_string()
}

fn cmd_set_resource_limits(_pod: &PodSnapshot) -> String {
    "kubectl set resources deployment/<deployment-name> -c <container> --limits=cpu=500m,memory=256Mi"
        .to_string()
}

fn cmd_probe_endpoint(pod: &PodSnapshot) -> String {
    format!(
        "kubectl exec {} -n {} -- curl -v localhost:<port>/<path>",
        pod.name, pod.namespace
    )
}

fn cmd_describe_readiness(pod: &PodSnapshot) -> String {
    format!(
        "kubectl describe pod {} -n {} | grep -A10 'Readiness'",
        pod.name, pod.namespace
    )
}

fn cmd_describe_nodes(_pod: &PodSnapshot) -> String {
    "kubectl describe nodes | grep -A5 'Allocated resources'".to_string()
}

fn cmd_describe_node(pod: &PodSnapshot) -> String {
    format!("kubectl describe node {}", pod.node.as_deref().unwrap_or_default())
}

fn cmd_tail_logs(pod: &PodSnapshot) -> String {
    format!("kubectl logs {} -n {} --tail=100", pod.name, pod.namespace)
}

static RULES: &[RecRule] = &[
    RecRule {
        category: category::CONTAINER,
        trigger: Trigger::ReasonIs("CrashLoopBackOff"),
        priority: 1,
        title: "Check container logs",
        description: "Review container logs to identify the crash cause",
        command: Some(cmd_previous_logs),
    },
    RecRule {
        category: category::CONTAINER,
        trigger: Trigger::ReasonIs("ImagePullBackOff"),
        priority: 1,
        title: "Verify image exists",
        description: "Check if the image exists and is accessible",
        command: Some(cmd_describe_pod),
    },
    RecRule {
        category: category::CONTAINER,
        trigger: Trigger::ReasonIs("ImagePullBackOff"),
        priority: 2,
        title: "Check image pull secrets",
        description: "Ensure imagePullSecrets are configured if using a private registry",
        command: None,
    },
    RecRule {
        category: category::CONTAINER,
        trigger: Trigger::ReasonIs("ErrImagePull"),
        priority: 1,
        title: "Verify image exists",
        description: "Check if the image exists and is accessible",
        command: Some(cmd_describe_pod),
    },
    RecRule {
        category: category::CONTAINER,
        trigger: Trigger::ReasonIs("ErrImagePull"),
        priority: 2,
        title: "Check image pull secrets",
        description: "Ensure imagePullSecrets are configured if using a private registry",
        command: None,
    },
    RecRule {
        category: category::RESOURCES,
        trigger: Trigger::ReasonIs("OOMKilled"),
        priority: 1,
        title: "Increase memory limit",
        description: "Container exceeded memory limit; consider increasing it",
        command: Some(cmd_set_memory_limit),
    },
    RecRule {
        category: category::RESOURCES,
        trigger: Trigger::TitleContains("No resource limits"),
        priority: 2,
        title: "Add resource limits",
        description: "Set resource limits to prevent resource contention",
        command: Some(cmd_set_resource_limits),
    },
    RecRule {
        category: category::RESOURCES,
        trigger: Trigger::TitleContains("BestEffort QoS"),
        priority: 2,
        title: "Configure resource requests and limits",
        description: "BestEffort pods are first to be evicted; add resources for better QoS",
        command: None,
    },
    RecRule {
        category: category::PROBES,
        trigger: Trigger::TitleContains("probe failed"),
        priority: 1,
        title: "Check probe endpoint",
        description: "Verify the probe endpoint is responding correctly",
        command: Some(cmd_probe_endpoint),
    },
    RecRule {
        category: category::PROBES,
        trigger: Trigger::TitleContains("No health probes"),
        priority: 3,
        title: "Add health probes",
        description: "Consider adding liveness and readiness probes for better health monitoring",
        command: None,
    },
    RecRule {
        category: category::PROBES,
        trigger: Trigger::TitleContains("running but not ready"),
        priority: 1,
        title: "Debug readiness probe",
        description: "Check why readiness probe is failing",
        command: Some(cmd_describe_readiness),
    },
    // Scheduling failures are hard to pin down, so both apply regardless
    // of the specific issue title.
    RecRule {
        category: category::SCHEDULING,
        trigger: Trigger::Always,
        priority: 1,
        title: "Check node resources",
        description: "Verify cluster has nodes with sufficient resources",
        command: Some(cmd_describe_nodes),
    },
    RecRule {
        category: category::SCHEDULING,
        trigger: Trigger::Always,
        priority: 2,
        title: "Review pod tolerations",
        description: "Check if pod has required tolerations for tainted nodes",
        command: None,
    },
    RecRule {
        category: category::NODE,
        trigger: Trigger::Always,
        priority: 1,
        title: "Check node status",
        description: "Review node conditions and events",
        command: Some(cmd_describe_node),
    },
    RecRule {
        category: category::LOGS,
        trigger: Trigger::Always,
        priority: 2,
        title: "Review full logs",
        description: "Check complete container logs for more context",
        command: Some(cmd_tail_logs),
    },
];

/// Generate deduplicated, priority-sorted recommendations for a set of
/// issues
pub fn generate_recommendations(issues: &[Issue], pod: &PodSnapshot) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let mut seen_titles: HashSet<&'static str> = HashSet::new();

    for issue in issues {
        for rule in RULES {
            if rule.category != issue.category || !rule.trigger.matches(issue) {
                continue;
            }
            if !seen_titles.insert(rule.title) {
                continue;
            }
            let mut rec = Recommendation::new(rule.priority, rule.title, rule.description);
            if let Some(command) = rule.command {
                rec = rec.with_command(command(pod));
            }
            recommendations.push(rec);
        }
    }

    recommendations.sort_by_key(|rec| rec.priority);
    recommendations
}
