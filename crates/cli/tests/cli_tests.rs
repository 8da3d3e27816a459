//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "pod-doctor-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Diagnose Kubernetes pod issues"),
        "Should show app description"
    );
    assert!(stdout.contains("diagnose"), "Should show diagnose command");
    assert!(stdout.contains("scan"), "Should show scan command");
    assert!(
        stdout.contains("--kubeconfig"),
        "Should show kubeconfig option"
    );
    assert!(
        stdout.contains("--namespace"),
        "Should show namespace option"
    );
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "pod-doctor-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("pod-doctor"), "Should show binary name");
}

/// Test diagnose subcommand help
#[test]
fn test_diagnose_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "pod-doctor-cli", "--", "diagnose", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Diagnose help should succeed");
    assert!(stdout.contains("<POD>"), "Should show pod argument");
}

/// Test scan subcommand help
#[test]
fn test_scan_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "pod-doctor-cli", "--", "scan", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Scan help should succeed");
    assert!(
        stdout.contains("--all-namespaces"),
        "Should show all-namespaces option"
    );
    assert!(
        stdout.contains("--unhealthy"),
        "Should show unhealthy option"
    );
    assert!(
        stdout.contains("--concurrency"),
        "Should show concurrency option"
    );
}

/// Test that diagnose requires a pod name
#[test]
fn test_diagnose_requires_pod() {
    let output = Command::new("cargo")
        .args(["run", "-p", "pod-doctor-cli", "--", "diagnose"])
        .output()
        .expect("Failed to execute command");

    assert!(
        !output.status.success(),
        "Diagnose without a pod should fail"
    );
}
