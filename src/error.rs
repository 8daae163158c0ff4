//! Error types for the extraction pipeline and job worker.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::model::DocumentStatus;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Error types that can occur while fetching, parsing, or extracting a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF header carries a version we do not understand.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The document has more pages than the configured ceiling.
    #[error("PDF has {pages} pages, exceeds limit of {limit}")]
    TooManyPages {
        /// Pages found in the document
        pages: u32,
        /// Configured maximum
        limit: u32,
    },

    /// The downloaded file is larger than the configured ceiling.
    #[error("PDF size {size} bytes exceeds limit of {} MB", .limit / BYTES_PER_MB)]
    FileTooLarge {
        /// Size of the downloaded payload in bytes
        size: u64,
        /// Configured maximum in bytes
        limit: u64,
    },

    /// An intake record could not be accepted.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The storage collaborator failed to deliver the object.
    #[error("Storage download failed for {path}: {reason}")]
    Storage {
        /// Storage path that was requested
        path: String,
        /// Transport or service message
        reason: String,
    },

    /// The requested object does not exist in storage.
    #[error("Object not found in storage: {0}")]
    ObjectNotFound(String),

    /// The database collaborator rejected a write.
    #[error("Database error: {0}")]
    Database(String),

    /// The job exceeded its wall-clock ceiling.
    #[error("Extraction timed out after {limit:?}")]
    Timeout {
        /// Configured ceiling
        limit: Duration,
    },

    /// A status change the job lifecycle does not allow.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: DocumentStatus,
        /// Requested status
        to: DocumentStatus,
    },

    /// Error while rendering tables or serializing results.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Recoverability class of an [`Error`].
///
/// Callers branch on the kind instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input violates policy (page ceiling, oversize file, bad job record).
    Validation,
    /// The source could not be fetched; an outer supervisor may retry.
    SourceUnavailable,
    /// The bytes are not a parseable PDF.
    CorruptDocument,
    /// The job ran past its time ceiling.
    Timeout,
    /// Any other fault.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TooManyPages { .. } | Error::FileTooLarge { .. } | Error::InvalidJob(_) => {
                ErrorKind::Validation
            }
            Error::Storage { .. } | Error::ObjectNotFound(_) => ErrorKind::SourceUnavailable,
            Error::UnknownFormat
            | Error::UnsupportedVersion(_)
            | Error::PdfParse(_)
            | Error::Encrypted
            | Error::Corrupted(_) => ErrorKind::CorruptDocument,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Io(_)
            | Error::PageOutOfRange(..)
            | Error::InvalidTransition { .. }
            | Error::Database(_)
            | Error::Render(_)
            | Error::Config(_)
            | Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether re-running the whole job could succeed.
    pub fn is_retriable(&self) -> bool {
        self.kind() == ErrorKind::SourceUnavailable
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Render(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::TooManyPages {
            pages: 1000,
            limit: 500,
        };
        assert_eq!(err.to_string(), "PDF has 1000 pages, exceeds limit of 500");
    }

    #[test]
    fn test_file_too_large_reports_megabytes() {
        let err = Error::FileTooLarge {
            size: 60 * BYTES_PER_MB,
            limit: 50 * BYTES_PER_MB,
        };
        assert_eq!(
            err.to_string(),
            format!("PDF size {} bytes exceeds limit of 50 MB", 60 * BYTES_PER_MB)
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::TooManyPages { pages: 2, limit: 1 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::FileTooLarge { size: 2, limit: 1 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::UnknownFormat.kind(), ErrorKind::CorruptDocument);
        assert_eq!(
            Error::PdfParse("bad xref".into()).kind(),
            ErrorKind::CorruptDocument
        );
        let timeout = Error::Timeout {
            limit: Duration::from_secs(3),
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert_eq!(timeout.to_string(), "Extraction timed out after 3s");
        assert_eq!(
            Error::Database("down".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_only_source_failures_are_retriable() {
        let storage = Error::Storage {
            path: "a/b.pdf".into(),
            reason: "connection reset".into(),
        };
        assert!(storage.is_retriable());
        assert!(Error::ObjectNotFound("a/b.pdf".into()).is_retriable());
        assert!(!Error::TooManyPages { pages: 9, limit: 1 }.is_retriable());
        assert!(!Error::Timeout {
            limit: Duration::from_millis(1)
        }
        .is_retriable());
        assert!(!Error::Corrupted("trailer".into()).is_retriable());
    }
}
