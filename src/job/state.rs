//! Status lifecycle of a single job.

use crate::error::{Error, Result};
use crate::model::DocumentStatus;

/// Tracks where one job is in its lifecycle.
///
/// Only transitions allowed by [`DocumentStatus::can_transition_to`] are
/// accepted; once a terminal status is reached nothing further is.
#[derive(Debug, Clone)]
pub struct JobState {
    status: DocumentStatus,
    history: Vec<DocumentStatus>,
}

impl JobState {
    /// A freshly queued job.
    pub fn new() -> Self {
        Self {
            status: DocumentStatus::Pending,
            history: vec![DocumentStatus::Pending],
        }
    }

    /// Current status.
    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Every status held so far, oldest first.
    pub fn history(&self) -> &[DocumentStatus] {
        &self.history
    }

    /// Check if the job has finished.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check a transition without applying it.
    pub fn check(&self, next: DocumentStatus) -> Result<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }

    /// Move to `next`.
    pub fn transition(&mut self, next: DocumentStatus) -> Result<()> {
        self.check(next)?;
        self.status = next;
        self.history.push(next);
        Ok(())
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}
