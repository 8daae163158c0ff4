//! # pdf-pipeline
//!
//! PDF extraction pipeline and job worker.
//!
//! Turns a stored PDF into a typed [`ExtractionResult`]: per-page text,
//! tables rendered as HTML and CSV, a SHA-256 content digest, and summary
//! metadata. The [`job`] module wraps the pipeline in a status lifecycle
//! driven against injected storage and database collaborators.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_pipeline::run_pipeline;
//!
//! fn main() -> pdf_pipeline::Result<()> {
//!     let result = run_pipeline("doc-1", "report.pdf")?;
//!     println!("{} pages, {} tables", result.metadata.total_pages, result.metadata.total_tables);
//!     println!("{}", result.raw_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Running jobs
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdf_pipeline::job::{Job, JobProcessor};
//! use pdf_pipeline::services::{FsDatabase, LocalStorage};
//! use pdf_pipeline::WorkerConfig;
//!
//! # fn main() -> pdf_pipeline::Result<()> {
//! let processor = JobProcessor::new(
//!     Arc::new(LocalStorage::new("./uploads")),
//!     Arc::new(FsDatabase::new("./results")?),
//!     WorkerConfig::default().with_max_pages(200),
//! )?;
//! let outcome = processor.process_job(&Job::new("doc-1", "user/report.pdf"));
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Fail-fast limits**: page ceiling checked before any extraction
//! - **Tables**: detected from text layout, rendered to HTML and CSV
//! - **Parallel pages**: Rayon per-page extraction, merged in page order
//! - **Typed errors**: every failure classified by [`ErrorKind`]
//! - **`async` feature**: run jobs on tokio's blocking pool

pub mod config;
pub mod detect;
pub mod error;
pub mod hash;
pub mod job;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod services;

// Re-export commonly used types
pub use config::{SupabaseConfig, WorkerConfig};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use error::{Error, ErrorKind, Result};
pub use hash::compute_hash;
pub use job::{Job, JobOutcome, JobProcessor, Worker, WorkerStats};
pub use model::{
    DocumentStatus, ExtractedTable, ExtractionMetadata, ExtractionMethod, ExtractionResult,
    PageContent, RawTable, TableCell,
};
pub use parser::{ErrorMode, ExtractOptions, PageExtractor, PdfSource};
pub use pipeline::{run_pipeline, Pipeline};

use std::path::Path;

/// Count the pages of a PDF file.
///
/// # Example
///
/// ```no_run
/// let pages = pdf_pipeline::get_page_count("report.pdf").unwrap();
/// println!("{} pages", pages);
/// ```
pub fn get_page_count<P: AsRef<Path>>(path: P) -> Result<u32> {
    PageExtractor::new().get_page_count(&PdfSource::Path(path.as_ref()))
}

/// Extract the text of every page of a PDF file, in page order.
///
/// A page without a text layer yields empty text.
pub fn extract_text_by_page<P: AsRef<Path>>(path: P) -> Result<Vec<PageContent>> {
    PageExtractor::new().extract_text_by_page(&PdfSource::Path(path.as_ref()))
}

/// Extract the tables of a PDF file, in page order.
///
/// # Example
///
/// ```no_run
/// for table in pdf_pipeline::extract_tables("report.pdf").unwrap() {
///     println!("page {}: {}", table.page, table.csv);
/// }
/// ```
pub fn extract_tables<P: AsRef<Path>>(path: P) -> Result<Vec<ExtractedTable>> {
    PageExtractor::new().extract_tables(&PdfSource::Path(path.as_ref()))
}

/// Extract the text of every page of an in-memory PDF.
pub fn extract_text_from_bytes(data: &[u8]) -> Result<Vec<PageContent>> {
    PageExtractor::new().extract_text_by_page(&PdfSource::Bytes(data))
}
