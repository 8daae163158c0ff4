//! Job lifecycle: intake, status transitions, working storage, and the
//! worker loop.
//!
//! A job moves `pending → downloading → extracting → completed | failed`.
//! [`JobProcessor::process_job`] drives one job through that lifecycle and
//! never returns an error: every failure is classified, reported as a
//! `failed` status, and surfaced as a [`JobOutcome`].

mod processor;
mod source;
mod state;
mod workdir;
mod worker;

#[cfg(feature = "async")]
mod async_task;

pub use processor::{JobOutcome, JobProcessor};
pub use source::{ChannelSource, JobSource, JsonLinesSource};
pub use state::JobState;
pub use workdir::{WorkDir, PDF_FILE_NAME};
pub use worker::{Worker, WorkerStats};

#[cfg(feature = "async")]
pub use async_task::process_job_async;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest accepted document identifier.
const MAX_DOCUMENT_ID_LEN: usize = 128;

/// One unit of work: extract one stored PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Identifier of the document row; also keys the working directory
    #[serde(alias = "document_id")]
    pub document_id: String,

    /// Storage path of the uploaded PDF
    #[serde(alias = "file_path", alias = "storage_path")]
    pub file_path: String,

    /// Uploading user, when the dispatcher provides it
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Original file name, when the dispatcher provides it
    #[serde(default, alias = "file_name", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Job {
    /// Create a job.
    pub fn new(document_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            file_path: file_path.into(),
            user_id: None,
            file_name: None,
        }
    }

    /// Attach the uploading user.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach the original file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Parse and validate a queue payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let job: Job = serde_json::from_str(payload)
            .map_err(|e| Error::InvalidJob(format!("malformed payload: {}", e)))?;
        job.validate()?;
        Ok(job)
    }

    /// Check the identifier and storage path.
    pub fn validate(&self) -> Result<()> {
        validate_document_id(&self.document_id)?;
        if self.file_path.trim().is_empty() {
            return Err(Error::InvalidJob("file path is empty".into()));
        }
        Ok(())
    }
}

/// Check that a document identifier is safe to use as a path component.
///
/// Accepts ASCII alphanumerics, `-`, `_` and `.`; rejects empty ids, `.`,
/// `..`, and anything longer than 128 bytes.
pub fn validate_document_id(document_id: &str) -> Result<()> {
    if document_id.is_empty() {
        return Err(Error::InvalidJob("document id is empty".into()));
    }
    if document_id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(Error::InvalidJob(format!(
            "document id longer than {} bytes",
            MAX_DOCUMENT_ID_LEN
        )));
    }
    if document_id == "." || document_id == ".." {
        return Err(Error::InvalidJob(format!(
            "document id {:?} is not allowed",
            document_id
        )));
    }
    if let Some(c) = document_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(Error::InvalidJob(format!(
            "document id contains invalid character {:?}",
            c
        )));
    }
    Ok(())
}
