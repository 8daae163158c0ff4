//! Extraction result and document status types.

use serde::{Deserialize, Serialize};

use super::{ExtractedTable, PageContent};

/// Processing status of a document.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Queued, not yet picked up
    #[default]
    Pending,
    /// Fetching the source bytes from storage
    Downloading,
    /// Running the extraction pipeline
    Extracting,
    /// Extraction persisted
    Completed,
    /// Job ended with an error
    Failed,
}

impl DocumentStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Downloading => "downloading",
            DocumentStatus::Extracting => "extracting",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    /// Check if no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    /// Check whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Every non-terminal status may fail; otherwise statuses advance one
    /// step at a time.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        match (self, next) {
            (Pending, Downloading) | (Downloading, Extracting) | (Extracting, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DocumentStatus::Pending),
            "downloading" => Ok(DocumentStatus::Downloading),
            "extracting" => Ok(DocumentStatus::Extracting),
            "completed" => Ok(DocumentStatus::Completed),
            "failed" => Ok(DocumentStatus::Failed),
            other => Err(crate::error::Error::Other(format!(
                "Unknown document status: {}",
                other
            ))),
        }
    }
}

/// Tag identifying the extraction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Content-stream extraction through lopdf
    #[default]
    Lopdf,
}

impl ExtractionMethod {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Lopdf => "lopdf",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary block attached to every [`ExtractionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Number of pages in the document
    pub total_pages: u32,

    /// Number of tables across all pages
    pub total_tables: usize,

    /// Characters across all page texts
    pub total_characters: usize,

    /// Wall-clock pipeline duration, rounded to two decimals
    pub processing_time_seconds: f64,

    /// Hex SHA-256 digest of the source bytes
    pub pdf_hash: String,

    /// Engine that produced the content
    pub extraction_method: ExtractionMethod,
}

/// Structured content extracted from one PDF.
///
/// Built once by the pipeline and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document identifier supplied by the caller
    pub document_id: String,

    /// Always [`DocumentStatus::Completed`] for pipeline output
    pub status: DocumentStatus,

    /// Aggregate metadata
    pub metadata: ExtractionMetadata,

    /// Non-empty page texts joined by a blank line, in page order
    pub raw_text: String,

    /// Tables in (page, detection) order
    pub tables: Vec<ExtractedTable>,

    /// One entry per page, ascending
    pub pages: Vec<PageContent>,

    /// Non-fatal problems encountered during extraction
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ExtractionResult {
    /// Total images across all pages.
    pub fn total_images(&self) -> usize {
        self.pages.iter().map(|p| p.images_count).sum()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to single-line JSON.
    pub fn to_json_compact(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
