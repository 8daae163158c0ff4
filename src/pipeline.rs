//! Extraction pipeline: one PDF in, one [`ExtractionResult`] out.
//!
//! The steps run strictly in order:
//!
//! 1. page-count check against the ceiling
//! 2. content digest
//! 3. per-page text
//! 4. tables
//! 5. aggregation into metadata
//!
//! The pipeline never reports a failed result. It either returns a completed
//! result or an error, and leaves status bookkeeping to the caller.

use std::path::Path;
use std::time::Instant;

use crate::config::DEFAULT_MAX_PAGES;
use crate::error::{Error, Result};
use crate::hash::compute_hash;
use crate::model::{
    DocumentStatus, ExtractedTable, ExtractionMetadata, ExtractionMethod, ExtractionResult,
    PageContent,
};
use crate::parser::{PageExtractor, PdfSource};

/// Separator placed between page texts in `raw_text`.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Composes page extraction, table rendering, and hashing.
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractor: PageExtractor,
    max_pages: u32,
}

impl Pipeline {
    /// Create a lopdf-backed pipeline with the given page ceiling.
    pub fn new(max_pages: u32) -> Self {
        Self::with_extractor(PageExtractor::new(), max_pages)
    }

    /// Create a pipeline over a custom extractor.
    pub fn with_extractor(extractor: PageExtractor, max_pages: u32) -> Self {
        Self {
            extractor,
            max_pages,
        }
    }

    /// Page ceiling.
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Underlying extractor.
    pub fn extractor(&self) -> &PageExtractor {
        &self.extractor
    }

    /// Run the pipeline over a local PDF.
    ///
    /// Fails with [`Error::TooManyPages`] before any text or table
    /// extraction when the document exceeds the page ceiling.
    pub fn run(&self, document_id: &str, pdf_path: &Path) -> Result<ExtractionResult> {
        let start = Instant::now();

        // One handle serves every pass; it is released when `doc` drops.
        let doc = self.extractor.open(&PdfSource::Path(pdf_path))?;

        let total_pages = doc.page_count();
        if total_pages > self.max_pages {
            return Err(Error::TooManyPages {
                pages: total_pages,
                limit: self.max_pages,
            });
        }

        let pdf_hash = compute_hash(pdf_path)?;
        let scan = self.extractor.scan_document(doc.as_ref())?;
        drop(doc);

        let elapsed = start.elapsed().as_secs_f64();
        let result = assemble(
            document_id,
            total_pages,
            scan.pages,
            scan.tables,
            pdf_hash,
            round_secs(elapsed),
            scan.errors,
        );

        log::info!(
            "[{}] Extracted {} pages, {} tables, {} characters in {:.2}s",
            document_id,
            result.metadata.total_pages,
            result.metadata.total_tables,
            result.metadata.total_characters,
            result.metadata.processing_time_seconds
        );

        Ok(result)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

/// Run the default lopdf pipeline over a local PDF.
pub fn run_pipeline<P: AsRef<Path>>(document_id: &str, pdf_path: P) -> Result<ExtractionResult> {
    Pipeline::default().run(document_id, pdf_path.as_ref())
}

/// Join non-empty page texts in page order.
pub fn join_page_texts(pages: &[PageContent]) -> String {
    pages
        .iter()
        .filter(|p| !p.text.is_empty())
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

fn assemble(
    document_id: &str,
    total_pages: u32,
    pages: Vec<PageContent>,
    tables: Vec<ExtractedTable>,
    pdf_hash: String,
    processing_time_seconds: f64,
    errors: Vec<String>,
) -> ExtractionResult {
    let metadata = ExtractionMetadata {
        total_pages,
        total_tables: tables.len(),
        total_characters: pages.iter().map(PageContent::char_count).sum(),
        processing_time_seconds,
        pdf_hash,
        extraction_method: ExtractionMethod::Lopdf,
    };

    ExtractionResult {
        document_id: document_id.to_string(),
        status: DocumentStatus::Completed,
        metadata,
        raw_text: join_page_texts(&pages),
        tables,
        pages,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_skips_empty_pages() {
        let pages = vec![
            PageContent::new(1, "Page 1"),
            PageContent::new(2, ""),
            PageContent::new(3, "Page 3"),
        ];
        assert_eq!(join_page_texts(&pages), "Page 1\n\nPage 3");
        assert_eq!(join_page_texts(&[]), "");
    }

    #[test]
    fn test_round_secs() {
        assert_eq!(round_secs(1.23456), 1.23);
        assert_eq!(round_secs(2.499), 2.5);
        assert_eq!(round_secs(0.0), 0.0);
    }

    #[test]
    fn test_assemble_metadata() {
        let pages = vec![PageContent::new(1, "héllo"), PageContent::new(2, "")];
        let result = assemble("doc", 2, pages, vec![], "ff".into(), 0.5, vec![]);

        assert_eq!(result.status, DocumentStatus::Completed);
        assert_eq!(result.metadata.total_characters, 5);
        assert_eq!(result.metadata.total_tables, 0);
        assert_eq!(result.raw_text, "héllo");
        assert_eq!(result.pages.len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = run_pipeline("doc", "/nonexistent/doc.pdf");
        assert!(result.is_err());
    }
}
