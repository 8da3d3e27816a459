//! Diagnostic engine for Kubernetes pods
//!
//! This crate provides the core functionality for:
//! - Analyzing pod status, events, logs, node health, resources and probes
//! - Classifying a pod's overall status
//! - Generating deduplicated, priority-sorted remediation recommendations
//! - Scanning many pods under bounded concurrency
//!
//! Cluster access goes through the [`source::SignalSource`] trait; the
//! engine itself never talks to the API server.

pub mod analyzer;
pub mod classify;
pub mod diagnose;
pub mod models;
pub mod patterns;
pub mod recommend;
pub mod scan;
pub mod source;

#[cfg(test)]
pub(crate) mod testutil;

pub use classify::classify_status;
pub use diagnose::Diagnostician;
pub use models::*;
pub use recommend::generate_recommendations;
pub use scan::{scan_pods, DEFAULT_CONCURRENCY};
pub use source::{PodRef, SignalSource, SourceError};
