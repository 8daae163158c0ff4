//! Async adapter tests.

#![cfg(feature = "async")]

mod common;

use std::sync::Arc;

use common::{FakeOpener, FakePdf, FakeStorage, RecordingDatabase};
use pdf_pipeline::job::{process_job_async, Job, JobOutcome, JobProcessor};
use pdf_pipeline::{DocumentStatus, ExtractOptions, PageExtractor, WorkerConfig};

#[tokio::test]
async fn test_process_job_on_blocking_pool() {
    let work = tempfile::tempdir().unwrap();
    let db = Arc::new(RecordingDatabase::new());
    let storage = FakeStorage::new().with_object("a.pdf", b"%PDF-1.4".to_vec());
    let opener = FakeOpener::new(FakePdf::with_texts(&["one", "two"]));
    let processor = JobProcessor::new(
        Arc::new(storage),
        db.clone(),
        WorkerConfig::default().with_temp_dir(work.path()),
    )
    .unwrap()
    .with_extractor(PageExtractor::with_opener(
        Arc::new(opener),
        ExtractOptions::default(),
    ));

    let outcome = process_job_async(Arc::new(processor), Job::new("async-1", "a.pdf")).await;

    assert_eq!(outcome, JobOutcome::Completed { pages: 2 });
    assert_eq!(db.terminal_calls()[0].status, DocumentStatus::Completed);
}
