//! Job-scoped working directories.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::validate_document_id;

/// File name of the downloaded PDF inside a working directory.
pub const PDF_FILE_NAME: &str = "document.pdf";

/// Working directory keyed by document id.
///
/// Removed by [`WorkDir::cleanup`], or on drop if cleanup never ran.
/// Removal failures are logged, never returned.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    removed: bool,
}

impl WorkDir {
    /// Reserve `<root>/<document_id>`. Nothing is created yet.
    pub fn new(root: &Path, document_id: &str) -> Result<Self> {
        validate_document_id(document_id)?;
        Ok(Self {
            path: root.join(document_id),
            removed: false,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the downloaded PDF lives.
    pub fn pdf_path(&self) -> PathBuf {
        self.path.join(PDF_FILE_NAME)
    }

    /// Create the directory.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Write the PDF bytes and return their path.
    pub fn write_pdf(&self, bytes: &[u8]) -> Result<PathBuf> {
        self.prepare()?;
        let pdf_path = self.pdf_path();
        std::fs::write(&pdf_path, bytes)?;
        Ok(pdf_path)
    }

    /// Remove the directory and everything in it.
    ///
    /// Returns `false` if removal failed.
    pub fn cleanup(mut self) -> bool {
        self.remove()
    }

    fn remove(&mut self) -> bool {
        if self.removed {
            return true;
        }
        self.removed = true;

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                log::debug!("Cleaned up working dir {}", self.path.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                log::warn!(
                    "Failed to clean up working dir {}: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.remove();
    }
}
