//! Pod analyzers
//!
//! Six independent analyzers each inspect one facet of pod state:
//! container status, events, logs, node conditions, resource
//! configuration, and health probes. The pipeline runs them in a fixed
//! order and isolates failures, so each analyzer only reports what it sees.

mod events;
mod logs;
mod node;
mod probes;
mod resources;
mod status;

pub use events::EventAnalyzer;
pub use logs::LogAnalyzer;
pub use node::NodeAnalyzer;
pub use probes::ProbeAnalyzer;
pub use resources::ResourceAnalyzer;
pub use status::StatusAnalyzer;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Issue, PodSnapshot};
use crate::source::SignalSource;

/// One facet of pod analysis
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyzer name, used in log output
    fn name(&self) -> &'static str;

    /// Inspect the pod and return detected issues
    async fn analyze(&self, pod: &PodSnapshot, source: &dyn SignalSource) -> Result<Vec<Issue>>;
}
