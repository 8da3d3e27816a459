//! Multi-pod scan command

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use doctor_lib::{scan_pods, Diagnostician, PodRef, SignalSource};

use crate::client::KubeSource;
use crate::output::{self, OutputFormat};

/// Upper bound for a whole scan; in-flight diagnoses are abandoned after it
const SCAN_TIMEOUT: Duration = Duration::from_secs(120);

/// Scan command options
pub struct ScanArgs {
    pub all_namespaces: bool,
    pub unhealthy: bool,
    pub selector: Option<String>,
    pub concurrency: usize,
}

/// Scan pods and render a summary
pub async fn run(
    source: Arc<KubeSource>,
    namespace: &str,
    args: ScanArgs,
    format: OutputFormat,
) -> Result<()> {
    let pods = if args.all_namespaces {
        source.list_all_pods().await.context("Failed to list pods")?
    } else {
        source
            .list_pods(namespace, args.selector.as_deref())
            .await
            .context("Failed to list pods")?
    };

    let refs: Vec<PodRef> = pods
        .iter()
        .map(|pod| PodRef::new(pod.namespace.clone(), pod.name.clone()))
        .collect();
    if refs.is_empty() {
        output::print_info("No pods found");
        return Ok(());
    }

    if matches!(format, OutputFormat::Console) {
        println!("Scanning {} pods...", refs.len());
    }

    let diagnostician = Arc::new(Diagnostician::new(source));
    let mut diagnoses = tokio::time::timeout(
        SCAN_TIMEOUT,
        scan_pods(diagnostician, refs, args.concurrency),
    )
    .await
    .context("Scan timed out")?;

    if args.unhealthy {
        diagnoses.retain(|diagnosis| !diagnosis.is_healthy());
    }

    match format {
        OutputFormat::Console => output::print_scan_summary(&diagnoses),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diagnoses)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&diagnoses)?),
    }

    Ok(())
}
