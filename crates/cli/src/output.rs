//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use doctor_lib::models::{Diagnosis, Issue, NodeHealth, PodStatus, Severity};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Longest detail value printed before truncation
const MAX_DETAIL_LEN: usize = 100;

/// Print a full diagnosis report to the console
pub fn print_diagnosis(diagnosis: &Diagnosis) {
    println!();
    println!(
        "{}",
        format!("Diagnosis: {}/{}", diagnosis.pod.namespace, diagnosis.pod.name).bold()
    );
    println!(
        "{}",
        format!(
            "Diagnosed at: {}",
            diagnosis.diagnosed_at.format("%Y-%m-%d %H:%M:%S")
        )
        .dimmed()
    );
    println!();

    print_pod_info(diagnosis);
    println!();
    print_issues(&diagnosis.issues);

    print_events(diagnosis);

    if let Some(node) = &diagnosis.node {
        print_node_health(node);
    }

    print_recommendations(diagnosis);
    println!();
}

fn print_pod_info(diagnosis: &Diagnosis) {
    let (icon, status) = styled_status(diagnosis.status);
    println!("Status: {} {}", icon, status);
    println!(
        "Node: {} | Phase: {} | Age: {} | Restarts: {}",
        diagnosis.pod.node.as_deref().unwrap_or("N/A"),
        diagnosis.pod.phase,
        diagnosis
            .pod
            .age_seconds
            .map(format_duration)
            .unwrap_or_else(|| "N/A".to_string()),
        diagnosis.pod.total_restarts(),
    );
    if let Some(ip) = &diagnosis.pod.ip {
        println!("Pod IP: {}", ip);
    }

    if !diagnosis.pod.containers.is_empty() {
        println!();
        println!("{}", "Containers:".bold());
        for container in &diagnosis.pod.containers {
            let state = if container.state.is_running() && container.ready {
                container.state.label().green()
            } else {
                container.state.label().yellow()
            };
            let ready = if container.ready { "ready" } else { "not ready" };
            println!(
                "  • {}: {} ({}, restarts: {})",
                container.name, state, ready, container.restart_count
            );
            if let Some(reason) = container.state_reason() {
                println!("    Reason: {}", reason.dimmed());
            }
        }
    }
}

fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("{}", "✓ No issues detected".green());
        return;
    }

    let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count();
    let warning = issues.iter().filter(|i| i.severity == Severity::Warning).count();
    let info = issues.iter().filter(|i| i.severity == Severity::Info).count();
    println!(
        "{}",
        format!("Issues Found: {} critical, {} warnings, {} info", critical, warning, info).bold()
    );
    println!();

    for issue in issues {
        print_issue(issue);
    }
}

fn print_issue(issue: &Issue) {
    let title = match issue.severity {
        Severity::Critical => format!("✗ {}", issue.title).red().bold(),
        Severity::Warning => format!("! {}", issue.title).yellow(),
        Severity::Info => format!("• {}", issue.title).blue(),
    };
    println!("  {}", title);
    println!("    {}", issue.description);

    for (key, value) in &issue.details {
        if key == "container" || key == "reason" || value.is_empty() {
            continue;
        }
        println!("    {}: {}", key.dimmed(), truncate(value, MAX_DETAIL_LEN));
    }
    println!();
}

fn print_events(diagnosis: &Diagnosis) {
    let warnings: Vec<_> = diagnosis
        .events
        .iter()
        .filter(|e| e.event_type == "Warning")
        .collect();
    if warnings.is_empty() {
        return;
    }

    println!("{}", "Recent Warning Events:".bold());
    for event in warnings {
        let last_seen = event
            .last_seen
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  • [{}] {}: {}",
            event.reason.yellow(),
            last_seen.dimmed(),
            truncate(&event.message, 80),
        );
    }
    println!();
}

fn print_node_health(node: &NodeHealth) {
    let healthy = node.ready
        && !node.memory_pressure
        && !node.disk_pressure
        && !node.pid_pressure
        && !node.network_unavailable;
    if healthy {
        return;
    }

    println!("{}", "Node Health:".bold());
    println!("  Node: {}", node.name);
    if !node.ready {
        println!("  {} Node is not ready", "✗".red().bold());
    }
    if node.memory_pressure {
        println!("  {} Memory pressure", "!".yellow());
    }
    if node.disk_pressure {
        println!("  {} Disk pressure", "!".yellow());
    }
    if node.pid_pressure {
        println!("  {} PID pressure", "!".yellow());
    }
    if node.network_unavailable {
        println!("  {} Network unavailable", "✗".red().bold());
    }
    println!();
}

fn print_recommendations(diagnosis: &Diagnosis) {
    if diagnosis.recommendations.is_empty() {
        return;
    }

    println!("{}", "Recommendations:".bold());
    for (index, rec) in diagnosis.recommendations.iter().enumerate() {
        println!("  {}. {}", index + 1, rec.title.bold());
        println!("     {}", rec.description);
        if let Some(command) = &rec.command {
            println!("     {} {}", "$".dimmed(), command.blue());
        }
    }
}

/// Row for the unhealthy-pods table in the scan summary
#[derive(Tabled)]
struct UnhealthyRow {
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Critical")]
    critical: usize,
    #[tabled(rename = "Warnings")]
    warnings: usize,
}

/// Print a summary of scanned pods
pub fn print_scan_summary(diagnoses: &[Diagnosis]) {
    println!();
    println!("{}", "Scan Summary".bold());
    println!();

    let healthy = diagnoses.iter().filter(|d| d.is_healthy()).count();
    let unhealthy = diagnoses.len() - healthy;

    println!("Total pods scanned: {}", diagnoses.len());
    println!("  {} Healthy: {}", "✓".green(), healthy);
    println!("  {} Unhealthy: {}", "✗".red(), unhealthy);

    if unhealthy == 0 {
        return;
    }

    let rows: Vec<UnhealthyRow> = diagnoses
        .iter()
        .filter(|d| !d.is_healthy())
        .map(|d| {
            let counts = d.issue_counts();
            let status = if counts.critical > 0 {
                d.status.to_string().red().to_string()
            } else {
                d.status.to_string().yellow().to_string()
            };
            UnhealthyRow {
                pod: format!("{}/{}", d.pod.namespace, d.pod.name),
                status,
                critical: counts.critical,
                warnings: counts.warning,
            }
        })
        .collect();

    println!();
    println!("{}", "Unhealthy Pods:".bold());
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

fn styled_status(status: PodStatus) -> (&'static str, String) {
    match status {
        PodStatus::Healthy => ("✓", status.to_string().green().to_string()),
        PodStatus::CrashLoopBackOff
        | PodStatus::ImagePullBackOff
        | PodStatus::OomKilled
        | PodStatus::Error
        | PodStatus::Evicted
        | PodStatus::CreateContainerError
        | PodStatus::CreateContainerConfigError => ("✗", status.to_string().red().bold().to_string()),
        PodStatus::Pending | PodStatus::NotReady | PodStatus::Terminating => {
            ("!", status.to_string().yellow().to_string())
        }
        PodStatus::Unknown => ("?", status.to_string().yellow().to_string()),
    }
}

/// Format an age in seconds as a compact duration
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h{}m", hours, minutes % 60);
    }
    format!("{}d{}h", hours / 24, hours % 24)
}

fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_len - 3).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_use_the_largest_two_units() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(12 * 60), "12m");
        assert_eq!(format_duration(3 * 3600 + 12 * 60), "3h12m");
        assert_eq!(format_duration(2 * 86400 + 3 * 3600), "2d3h");
    }

    #[test]
    fn long_values_are_truncated_with_ellipsis() {
        let long = "v".repeat(150);
        let truncated = truncate(&long, 100);
        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate("short", 100), "short");
    }
}
