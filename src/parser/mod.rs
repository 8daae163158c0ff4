//! PDF parsing module.

mod backend;
mod extractor;
mod options;
mod spans;
mod table_detector;

pub use backend::{LopdfBackend, LopdfOpener, PdfBackend, PdfOpener, PdfSource};
pub use extractor::{DocumentScan, PageExtractor, PageScan};
pub use options::{ErrorMode, ExtractOptions};
pub use spans::{decode_text_simple, extract_page_spans, TextSpan};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
