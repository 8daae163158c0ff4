//! Worker loop over a job source.

use std::sync::Arc;

use crossbeam_channel::Receiver;

use super::{Job, JobOutcome, JobProcessor, JobSource};

/// Counts of how jobs ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Jobs that reached `completed`
    pub completed: usize,
    /// Jobs that reached `failed`
    pub failed: usize,
    /// Intake records that never became jobs
    pub rejected: usize,
}

impl WorkerStats {
    /// Every record seen.
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.rejected
    }

    fn merge(&mut self, other: WorkerStats) {
        self.completed += other.completed;
        self.failed += other.failed;
        self.rejected += other.rejected;
    }

    fn record(&mut self, outcome: &JobOutcome) {
        if outcome.is_success() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Processes jobs one at a time.
#[derive(Debug, Clone)]
pub struct Worker {
    processor: Arc<JobProcessor>,
}

impl Worker {
    /// Create a worker.
    pub fn new(processor: Arc<JobProcessor>) -> Self {
        Self { processor }
    }

    /// Shared processor.
    pub fn processor(&self) -> &Arc<JobProcessor> {
        &self.processor
    }

    /// Drain `source`, one job to completion before the next.
    ///
    /// Malformed records are logged and counted, never fatal.
    pub fn run<S: JobSource + ?Sized>(&self, source: &mut S) -> WorkerStats {
        let mut stats = WorkerStats::default();
        while let Some(next) = source.next_job() {
            match next {
                Ok(job) => stats.record(&self.processor.process_job(&job)),
                Err(e) => {
                    log::warn!("Skipping job record: {}", e);
                    stats.rejected += 1;
                }
            }
        }
        log::info!(
            "Worker finished: {} completed, {} failed, {} rejected",
            stats.completed,
            stats.failed,
            stats.rejected
        );
        stats
    }

    /// Run `workers` threads pulling from one shared receiver until every
    /// sender is dropped.
    ///
    /// Each thread keeps its own counts; they are merged once all threads
    /// have joined. A panicked thread is logged and contributes nothing.
    pub fn run_concurrent(&self, rx: Receiver<Job>, workers: usize) -> WorkerStats {
        let handles: Vec<_> = (0..workers.max(1))
            .map(|n| {
                let rx = rx.clone();
                let processor = Arc::clone(&self.processor);
                std::thread::Builder::new()
                    .name(format!("job-worker-{}", n))
                    .spawn(move || drain_channel(&processor, &rx))
            })
            .collect();
        drop(rx);

        let mut stats = WorkerStats::default();
        for handle in handles {
            match handle.map(|h| h.join()) {
                Ok(Ok(part)) => stats.merge(part),
                Ok(Err(_)) => log::error!("Worker thread panicked"),
                Err(e) => log::error!("Failed to spawn worker thread: {}", e),
            }
        }
        stats
    }
}

fn drain_channel(processor: &JobProcessor, rx: &Receiver<Job>) -> WorkerStats {
    let mut stats = WorkerStats::default();
    for job in rx.iter() {
        match job.validate() {
            Ok(()) => stats.record(&processor.process_job(&job)),
            Err(e) => {
                log::warn!("Skipping job record: {}", e);
                stats.rejected += 1;
            }
        }
    }
    stats
}
