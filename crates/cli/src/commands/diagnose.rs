//! Single-pod diagnosis command

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use doctor_lib::Diagnostician;

use crate::client::KubeSource;
use crate::output::{self, OutputFormat};

/// Upper bound for one diagnosis, including log and event fetches
const DIAGNOSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Diagnose one pod and render the result
pub async fn run(
    source: Arc<KubeSource>,
    namespace: &str,
    pod: &str,
    format: OutputFormat,
) -> Result<()> {
    if matches!(format, OutputFormat::Console) {
        println!("Diagnosing pod {}/{}...", namespace, pod);
    }

    let diagnostician = Diagnostician::new(source);
    let diagnosis = tokio::time::timeout(DIAGNOSE_TIMEOUT, diagnostician.diagnose(namespace, pod))
        .await
        .context("Diagnosis timed out")?
        .context("Failed to diagnose pod")?;

    match format {
        OutputFormat::Console => output::print_diagnosis(&diagnosis),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diagnosis)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&diagnosis)?),
    }

    Ok(())
}
