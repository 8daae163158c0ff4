//! Page extractor: per-page text, tables, and image counts.

use std::sync::Arc;

use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::{ExtractedTable, PageContent};
use crate::render::build_table;

use super::backend::{LopdfOpener, PdfBackend, PdfOpener, PdfSource};
use super::options::{ErrorMode, ExtractOptions};

/// Output of a page-by-page pass plus the failures that lenient mode absorbed.
#[derive(Debug, Clone)]
pub struct PageScan<T> {
    /// Items in page order
    pub items: Vec<T>,
    /// Human-readable messages for pages that failed and were skipped
    pub errors: Vec<String>,
}

impl<T> Default for PageScan<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Pages and tables gathered in a single pass over a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentScan {
    /// One entry per page, in page order
    pub pages: Vec<PageContent>,
    /// Tables in (page, detection) order
    pub tables: Vec<ExtractedTable>,
    /// Messages for page-level failures absorbed in lenient mode
    pub errors: Vec<String>,
}

struct PagePass {
    content: PageContent,
    tables: Vec<ExtractedTable>,
    errors: Vec<String>,
}

/// Extracts page content through a [`PdfOpener`].
///
/// Each public operation opens the source, works on it, and releases it
/// before returning.
#[derive(Clone)]
pub struct PageExtractor {
    opener: Arc<dyn PdfOpener>,
    options: ExtractOptions,
}

impl PageExtractor {
    /// Create an extractor backed by lopdf with default options.
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    /// Create an extractor backed by lopdf.
    pub fn with_options(options: ExtractOptions) -> Self {
        let opener = LopdfOpener::with_table_detector(options.table_detector.clone());
        Self::with_opener(Arc::new(opener), options)
    }

    /// Create an extractor over any opener.
    pub fn with_opener(opener: Arc<dyn PdfOpener>, options: ExtractOptions) -> Self {
        Self { opener, options }
    }

    /// Current options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Open a source for several passes over one handle.
    pub fn open(&self, source: &PdfSource<'_>) -> Result<Box<dyn PdfBackend>> {
        self.opener.open(source)
    }

    /// Total number of pages in the source.
    pub fn get_page_count(&self, source: &PdfSource<'_>) -> Result<u32> {
        let doc = self.open(source)?;
        Ok(doc.page_count())
    }

    /// Per-page content in page order, one entry per page.
    pub fn extract_text_by_page(&self, source: &PdfSource<'_>) -> Result<Vec<PageContent>> {
        let doc = self.open(source)?;
        Ok(self.scan_pages(doc.as_ref())?.items)
    }

    /// Tables in (page, detection) order.
    pub fn extract_tables(&self, source: &PdfSource<'_>) -> Result<Vec<ExtractedTable>> {
        let doc = self.open(source)?;
        Ok(self.scan_tables(doc.as_ref())?.items)
    }

    /// Per-page content from an already opened document.
    pub fn scan_pages(&self, doc: &dyn PdfBackend) -> Result<PageScan<PageContent>> {
        let results = self.per_page(doc, |page| self.page_pass(doc, page))?;

        let mut scan = PageScan::default();
        for pass in results {
            scan.items.push(pass.content);
            scan.errors.extend(pass.errors);
        }
        Ok(scan)
    }

    /// Pages and tables from an already opened document.
    ///
    /// Table detection runs once per page and feeds both the per-page
    /// counts and the extracted tables.
    pub fn scan_document(&self, doc: &dyn PdfBackend) -> Result<DocumentScan> {
        let results = self.per_page(doc, |page| self.page_pass(doc, page))?;

        let mut scan = DocumentScan::default();
        for pass in results {
            scan.pages.push(pass.content);
            scan.tables.extend(pass.tables);
            scan.errors.extend(pass.errors);
        }
        Ok(scan)
    }

    /// Tables from an already opened document.
    pub fn scan_tables(&self, doc: &dyn PdfBackend) -> Result<PageScan<ExtractedTable>> {
        let results = self.per_page(doc, |page| {
            let grids = self.lenient(page, "table extraction", doc.page_tables(page))?;
            Ok((page, grids))
        })?;

        let mut scan = PageScan::default();
        for (page, (grids, error)) in results {
            scan.items
                .extend(grids.unwrap_or_default().iter().filter_map(|g| build_table(page, g)));
            scan.errors.extend(error);
        }
        Ok(scan)
    }

    /// Run `f` for every page, in parallel when enabled, keeping page order.
    fn per_page<T, F>(&self, doc: &dyn PdfBackend, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(u32) -> Result<T> + Sync + Send,
    {
        let count = doc.page_count();
        if self.options.parallel && count > 1 {
            (1..=count).into_par_iter().map(&f).collect()
        } else {
            (1..=count).map(&f).collect()
        }
    }

    fn page_pass(&self, doc: &dyn PdfBackend, page: u32) -> Result<PagePass> {
        let mut errors = Vec::new();

        let (text, error) = self.lenient(page, "text extraction", doc.page_text(page))?;
        errors.extend(error);
        let text = self.clean_text(&text.unwrap_or_default());

        let (grids, error) = self.lenient(page, "table extraction", doc.page_tables(page))?;
        errors.extend(error);
        let tables: Vec<ExtractedTable> = grids
            .unwrap_or_default()
            .iter()
            .filter_map(|g| build_table(page, g))
            .collect();

        let (images, error) = self.lenient(page, "image counting", doc.page_image_count(page))?;
        errors.extend(error);

        let content = PageContent {
            page_number: page,
            text,
            tables_count: tables.len(),
            images_count: images.unwrap_or(0),
        };
        Ok(PagePass {
            content,
            tables,
            errors,
        })
    }

    /// Apply the error mode to one page-level result.
    ///
    /// Strict mode propagates; lenient mode returns `None` with a message.
    fn lenient<T>(
        &self,
        page: u32,
        what: &str,
        result: Result<T>,
    ) -> Result<(Option<T>, Option<String>)> {
        match result {
            Ok(value) => Ok((Some(value), None)),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Page {}: {} failed: {}", page, what, e);
                Ok((None, Some(format!("Page {}: {} failed: {}", page, what, e))))
            }
            Err(e) => Err(e),
        }
    }

    fn clean_text(&self, text: &str) -> String {
        if self.options.normalize_unicode {
            text.nfc().collect::<String>().trim().to_string()
        } else {
            text.trim().to_string()
        }
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PageExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageExtractor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
