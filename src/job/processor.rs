//! Drives one job from `pending` to a terminal status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;

use crate::config::WorkerConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::model::{DocumentStatus, ExtractionResult};
use crate::parser::PageExtractor;
use crate::pipeline::Pipeline;
use crate::services::{Database, Storage};

use super::{Job, JobState, WorkDir};

/// How a job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Result saved and status set to `completed`.
    Completed {
        /// Total pages in the document
        pages: u32,
    },
    /// Status set to `failed` (or at least attempted).
    Failed {
        /// Classification of the failure
        kind: ErrorKind,
        /// Message recorded as the job's error
        message: String,
    },
}

impl JobOutcome {
    /// Check if the job completed.
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }

    /// Check if an outer supervisor could usefully re-run the job.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            JobOutcome::Failed {
                kind: ErrorKind::SourceUnavailable,
                ..
            }
        )
    }
}

/// Runs jobs against injected storage and database collaborators.
///
/// Holds no per-job state, so one processor can be shared by many worker
/// threads.
pub struct JobProcessor {
    storage: Arc<dyn Storage>,
    database: Arc<dyn Database>,
    pipeline: Arc<Pipeline>,
    config: WorkerConfig,
}

impl JobProcessor {
    /// Create a processor with the default lopdf pipeline.
    pub fn new(
        storage: Arc<dyn Storage>,
        database: Arc<dyn Database>,
        config: WorkerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let pipeline = Arc::new(Pipeline::new(config.max_pages));
        Ok(Self {
            storage,
            database,
            pipeline,
            config,
        })
    }

    /// Replace the page extractor, keeping the configured page ceiling.
    pub fn with_extractor(mut self, extractor: PageExtractor) -> Self {
        self.pipeline = Arc::new(Pipeline::with_extractor(extractor, self.config.max_pages));
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Process one job to a terminal status.
    ///
    /// Never returns an error. Failures end in a `failed` status update,
    /// and the working directory is removed on every path.
    pub fn process_job(&self, job: &Job) -> JobOutcome {
        let started = Instant::now();
        let id = job.document_id.as_str();
        let mut state = JobState::new();

        log::info!("[{}] Processing {}", id, job.file_path);

        let workdir = match job
            .validate()
            .and_then(|_| WorkDir::new(&self.config.temp_dir, id))
        {
            Ok(dir) => dir,
            Err(e) => return self.fail(id, &mut state, e),
        };

        let outcome = match self.execute(job, &workdir, &mut state, started) {
            Ok(result) => JobOutcome::Completed {
                pages: result.metadata.total_pages,
            },
            Err(e) => self.fail(id, &mut state, e),
        };

        workdir.cleanup();

        if let JobOutcome::Completed { pages } = outcome {
            log::info!(
                "[{}] Completed {} pages in {:.2}s",
                id,
                pages,
                started.elapsed().as_secs_f64()
            );
        }
        outcome
    }

    fn execute(
        &self,
        job: &Job,
        workdir: &WorkDir,
        state: &mut JobState,
        started: Instant,
    ) -> Result<ExtractionResult> {
        let id = job.document_id.as_str();

        self.set_status(id, state, DocumentStatus::Downloading, None)?;
        let bytes = self.storage.download(&job.file_path)?;
        let size = bytes.len() as u64;
        if size > self.config.max_pdf_size_bytes {
            return Err(Error::FileTooLarge {
                size,
                limit: self.config.max_pdf_size_bytes,
            });
        }
        let pdf_path = workdir.write_pdf(&bytes)?;
        drop(bytes);
        log::debug!("[{}] Downloaded {} bytes", id, size);

        self.set_status(id, state, DocumentStatus::Extracting, None)?;
        let remaining = self
            .config
            .task_timeout
            .checked_sub(started.elapsed())
            .unwrap_or(Duration::ZERO);
        let result = self.run_with_deadline(id, pdf_path, remaining)?;

        self.database.save_extraction(id, &result)?;
        self.set_status(
            id,
            state,
            DocumentStatus::Completed,
            Some(result.metadata.total_pages),
        )?;
        Ok(result)
    }

    /// Run the pipeline on its own thread and wait at most `remaining`.
    ///
    /// On timeout the thread is left to finish on its own.
    fn run_with_deadline(
        &self,
        id: &str,
        pdf_path: std::path::PathBuf,
        remaining: Duration,
    ) -> Result<ExtractionResult> {
        let limit = self.config.task_timeout;
        if remaining.is_zero() {
            return Err(Error::Timeout { limit });
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let pipeline = Arc::clone(&self.pipeline);
        let document_id = id.to_string();
        std::thread::Builder::new()
            .name(format!("extract-{}", id))
            .spawn(move || {
                let result = pipeline.run(&document_id, &pdf_path);
                // The receiver is gone if the job already timed out.
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout { limit }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Other("extraction thread panicked".into()))
            }
        }
    }

    fn set_status(
        &self,
        id: &str,
        state: &mut JobState,
        next: DocumentStatus,
        pages: Option<u32>,
    ) -> Result<()> {
        state.check(next)?;
        self.database.update_status(id, next, pages, None)?;
        state.transition(next)
    }

    fn fail(&self, id: &str, state: &mut JobState, err: Error) -> JobOutcome {
        let kind = err.kind();
        let message = err.to_string();
        log::error!("[{}] Job failed ({:?}): {}", id, kind, message);

        if let Err(e) = state.check(DocumentStatus::Failed) {
            log::error!("[{}] {}", id, e);
        } else if let Err(e) =
            self.database
                .update_status(id, DocumentStatus::Failed, None, Some(&message))
        {
            log::error!("[{}] Failed to record failed status: {}", id, e);
        } else if let Err(e) = state.transition(DocumentStatus::Failed) {
            log::error!("[{}] {}", id, e);
        }

        JobOutcome::Failed { kind, message }
    }
}

impl std::fmt::Debug for JobProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobProcessor")
            .field("pipeline", &self.pipeline)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
