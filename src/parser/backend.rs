//! PDF backend abstraction layer.
//!
//! The page extractor only needs four questions answered per document: how
//! many pages, and per page its text, its table grids, and its image count.
//! [`PdfBackend`] captures exactly that so the concrete PDF library (lopdf)
//! stays behind one seam and tests can substitute a fake.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::RawTable;

use super::spans::{extract_page_spans, page_content};
use super::table_detector::{TableDetector, TableDetectorConfig};

/// Where the PDF bytes come from.
#[derive(Debug, Clone, Copy)]
pub enum PdfSource<'a> {
    /// In-memory bytes
    Bytes(&'a [u8]),
    /// Local file
    Path(&'a Path),
}

impl<'a> PdfSource<'a> {
    /// Source backed by a local file.
    pub fn path<P: AsRef<Path> + ?Sized>(path: &'a P) -> Self {
        PdfSource::Path(path.as_ref())
    }

    /// Source backed by a byte buffer.
    pub fn bytes(data: &'a [u8]) -> Self {
        PdfSource::Bytes(data)
    }

    /// Short description for log messages.
    pub fn describe(&self) -> String {
        match self {
            PdfSource::Bytes(data) => format!("<{} bytes>", data.len()),
            PdfSource::Path(path) => path.display().to_string(),
        }
    }
}

impl<'a> From<&'a Path> for PdfSource<'a> {
    fn from(path: &'a Path) -> Self {
        PdfSource::Path(path)
    }
}

impl<'a> From<&'a [u8]> for PdfSource<'a> {
    fn from(data: &'a [u8]) -> Self {
        PdfSource::Bytes(data)
    }
}

/// An opened PDF document.
///
/// Dropping the value releases the document, so holding it in a scope is
/// the acquisition: every exit path closes it.
pub trait PdfBackend: Send + Sync {
    /// Total number of pages.
    fn page_count(&self) -> u32;

    /// Text of a page (1-indexed). Empty when the page has no text layer.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Raw table grids found on a page, in detection order.
    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>>;

    /// Number of images placed on a page.
    fn page_image_count(&self, page: u32) -> Result<usize>;
}

/// Opens a [`PdfSource`] into a [`PdfBackend`].
pub trait PdfOpener: Send + Sync {
    /// Open and parse the source.
    ///
    /// Fails with a corrupt-document error when the source is not a PDF.
    fn open(&self, source: &PdfSource<'_>) -> Result<Box<dyn PdfBackend>>;
}

/// [`PdfOpener`] backed by lopdf.
#[derive(Debug, Clone, Default)]
pub struct LopdfOpener {
    detector: TableDetectorConfig,
}

impl LopdfOpener {
    /// Create an opener with default table detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an opener with custom table detection.
    pub fn with_table_detector(config: TableDetectorConfig) -> Self {
        Self { detector: config }
    }
}

impl PdfOpener for LopdfOpener {
    fn open(&self, source: &PdfSource<'_>) -> Result<Box<dyn PdfBackend>> {
        let backend = match source {
            PdfSource::Bytes(data) => LopdfBackend::load_bytes(data)?,
            PdfSource::Path(path) => LopdfBackend::load_file(path)?,
        };
        Ok(Box::new(
            backend.with_detector(TableDetector::with_config(self.detector.clone())),
        ))
    }
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    detector: TableDetector,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_format_from_path(path)?;
        let doc = LopdfDocument::load(path)?;
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        Self {
            doc,
            pages,
            detector: TableDetector::new(),
        }
    }

    /// Replace the table detector.
    pub fn with_detector(mut self, detector: TableDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a lopdf::Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let page_id = self.page_id(page)?;
        // lopdf rejects pages without a content stream; those are blank.
        if page_content(&self.doc, page_id)?.is_empty() {
            return Ok(String::new());
        }
        self.doc
            .extract_text(&[page])
            .map_err(|e| Error::PdfParse(format!("Page {}: {}", page, e)))
    }

    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>> {
        let page_id = self.page_id(page)?;
        let spans = extract_page_spans(&self.doc, page_id)?;
        Ok(self
            .detector
            .detect(&spans)
            .iter()
            .map(|t| t.to_grid())
            .collect())
    }

    fn page_image_count(&self, page: u32) -> Result<usize> {
        let page_id = self.page_id(page)?;
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let xobjects = page_dict
            .get(b"Resources")
            .ok()
            .and_then(|res| self.resolve_dict(res))
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xobj| self.resolve_dict(xobj));

        let Some(xobjects) = xobjects else {
            return Ok(0);
        };

        let count = xobjects
            .iter()
            .filter_map(|(_, obj)| obj.as_reference().ok())
            .filter_map(|r| match self.doc.get_object(r) {
                Ok(Object::Stream(stream)) => Some(stream),
                _ => None,
            })
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name_str())
                    .map(|s| s == "Image")
                    .unwrap_or(false)
            })
            .count();

        Ok(count)
    }
}
