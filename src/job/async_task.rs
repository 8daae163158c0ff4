//! Task-queue style adapter for async callers.

use std::sync::Arc;

use crate::error::ErrorKind;

use super::{Job, JobOutcome, JobProcessor};

/// Run [`JobProcessor::process_job`] on tokio's blocking pool.
///
/// Must be called from within a tokio runtime.
pub async fn process_job_async(processor: Arc<JobProcessor>, job: Job) -> JobOutcome {
    let document_id = job.document_id.clone();
    match tokio::task::spawn_blocking(move || processor.process_job(&job)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("[{}] Job task aborted: {}", document_id, e);
            JobOutcome::Failed {
                kind: ErrorKind::Internal,
                message: format!("job task aborted: {}", e),
            }
        }
    }
}
