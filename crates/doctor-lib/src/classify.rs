//! Pod status classification

use crate::models::{ContainerState, PodPhase, PodSnapshot, PodStatus};

/// Classify the high-level status of a pod.
///
/// Evaluated in a fixed order, first match wins: deletion, OOMKilled last
/// termination, waiting-state reasons, then phase. An OOM-killed container
/// outranks its own crash-loop waiting state.
pub fn classify_status(pod: &PodSnapshot) -> PodStatus {
    if pod.deletion_requested {
        return PodStatus::Terminating;
    }

    for container in &pod.containers {
        if let Some(term) = &container.last_termination {
            if term.reason == "OOMKilled" {
                return PodStatus::OomKilled;
            }
        }
    }

    for container in &pod.containers {
        if let ContainerState::Waiting { reason, .. } = &container.state {
            match reason.as_str() {
                "CrashLoopBackOff" => return PodStatus::CrashLoopBackOff,
                "ImagePullBackOff" | "ErrImagePull" => return PodStatus::ImagePullBackOff,
                "CreateContainerError" => return PodStatus::CreateContainerError,
                "CreateContainerConfigError" => return PodStatus::CreateContainerConfigError,
                _ => {}
            }
        }
    }

    match pod.phase {
        PodPhase::Pending => PodStatus::Pending,
        PodPhase::Failed => {
            if pod.reason.as_deref() == Some("Evicted") {
                PodStatus::Evicted
            } else {
                PodStatus::Error
            }
        }
        PodPhase::Running => {
            if pod.containers.iter().any(|c| !c.ready) {
                PodStatus::NotReady
            } else {
                PodStatus::Healthy
            }
        }
        PodPhase::Succeeded => PodStatus::Healthy,
        PodPhase::Unknown => PodStatus::Unknown,
    }
}
