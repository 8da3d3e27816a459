//! Multi-pod scan coordination

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

use crate::diagnose::Diagnostician;
use crate::models::Diagnosis;
use crate::source::PodRef;

/// Default number of concurrent diagnoses
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Diagnose many pods under a bounded concurrency limit.
///
/// Pods that fail to diagnose are dropped from the result. The call blocks
/// until every submitted diagnosis has finished; the output carries no
/// ordering guarantee.
pub async fn scan_pods(
    diagnostician: Arc<Diagnostician>,
    pods: Vec<PodRef>,
    concurrency: usize,
) -> Vec<Diagnosis> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let results = Arc::new(Mutex::new(Vec::with_capacity(pods.len())));

    let mut handles = Vec::with_capacity(pods.len());
    for pod in pods {
        let semaphore = Arc::clone(&semaphore);
        let diagnostician = Arc::clone(&diagnostician);
        let results = Arc::clone(&results);

        handles.push(tokio::spawn(async move {
            // The semaphore is never closed; a failed acquire means shutdown.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            match diagnostician.diagnose(&pod.namespace, &pod.name).await {
                Ok(diagnosis) => results.lock().await.push(diagnosis),
                Err(err) => {
                    debug!(pod = %pod, error = %err, "skipping pod that failed to diagnose");
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let mut results = results.lock().await;
    std::mem::take(&mut *results)
}
