//! Shared fixtures: in-memory PDFs and collaborator fakes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pdf_pipeline::error::{Error, Result};
use pdf_pipeline::parser::{PdfBackend, PdfOpener, PdfSource};
use pdf_pipeline::services::{Database, Storage};
use pdf_pipeline::{DocumentStatus, ExtractionResult, RawTable};

// ---------------------------------------------------------------------------
// PDF builder
// ---------------------------------------------------------------------------

/// Text drawn at an absolute position on a page.
#[derive(Debug, Clone)]
pub struct Placed {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

pub fn at(text: &str, x: f32, y: f32) -> Placed {
    Placed {
        text: text.to_string(),
        x,
        y,
    }
}

/// Build a PDF with one page per entry. An empty entry is a page with no
/// content stream.
pub fn build_pdf(pages: &[Vec<Placed>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for placed in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };

        if !placed.is_empty() {
            let mut operations = Vec::new();
            for item in placed {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![item.x.into(), item.y.into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(item.text.as_str())],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            page.set("Contents", content_id);
        }

        kids.push(doc.add_object(page).into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

/// One line of text per page, at a fixed position.
pub fn text_pdf(texts: &[&str]) -> Vec<u8> {
    let pages: Vec<Vec<Placed>> = texts
        .iter()
        .map(|t| {
            if t.is_empty() {
                vec![]
            } else {
                vec![at(t, 72.0, 720.0)]
            }
        })
        .collect();
    build_pdf(&pages)
}

/// A page with a title and a two-column table under it.
pub fn table_page(title: &str, rows: &[[&str; 2]]) -> Vec<Placed> {
    let mut placed = vec![at(title, 300.0, 750.0)];
    for (i, row) in rows.iter().enumerate() {
        let y = 700.0 - 20.0 * i as f32;
        placed.push(at(row[0], 100.0, y));
        placed.push(at(row[1], 200.0, y));
    }
    placed
}

// ---------------------------------------------------------------------------
// Fake PDF backend
// ---------------------------------------------------------------------------

/// Counts how often each backend operation ran.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub opens: AtomicUsize,
    pub text_calls: AtomicUsize,
    pub table_calls: AtomicUsize,
}

impl CallCounts {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn table_calls(&self) -> usize {
        self.table_calls.load(Ordering::SeqCst)
    }
}

/// Document served by [`FakeOpener`].
#[derive(Debug, Clone, Default)]
pub struct FakePdf {
    pub texts: Vec<String>,
    pub tables: HashMap<u32, Vec<RawTable>>,
    pub images: HashMap<u32, usize>,
    pub delay: Option<Duration>,
}

impl FakePdf {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn blank_pages(count: usize) -> Self {
        Self {
            texts: vec![String::new(); count],
            ..Default::default()
        }
    }

    pub fn table(mut self, page: u32, grid: RawTable) -> Self {
        self.tables.entry(page).or_default().push(grid);
        self
    }

    pub fn images(mut self, page: u32, count: usize) -> Self {
        self.images.insert(page, count);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub fn grid(rows: &[&[&str]]) -> RawTable {
    rows.iter()
        .map(|row| row.iter().map(|c| Some(c.to_string())).collect())
        .collect()
}

/// Opener that ignores the source and serves a fixed [`FakePdf`].
#[derive(Debug, Clone)]
pub struct FakeOpener {
    pub pdf: FakePdf,
    pub counts: Arc<CallCounts>,
}

impl FakeOpener {
    pub fn new(pdf: FakePdf) -> Self {
        Self {
            pdf,
            counts: Arc::new(CallCounts::default()),
        }
    }
}

impl PdfOpener for FakeOpener {
    fn open(&self, _source: &PdfSource<'_>) -> Result<Box<dyn PdfBackend>> {
        self.counts.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBackend {
            pdf: self.pdf.clone(),
            counts: Arc::clone(&self.counts),
        }))
    }
}

struct FakeBackend {
    pdf: FakePdf,
    counts: Arc<CallCounts>,
}

impl PdfBackend for FakeBackend {
    fn page_count(&self) -> u32 {
        self.pdf.texts.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.counts.text_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.pdf.delay {
            std::thread::sleep(delay);
        }
        self.pdf
            .texts
            .get(page as usize - 1)
            .cloned()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>> {
        self.counts.table_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pdf.tables.get(&page).cloned().unwrap_or_default())
    }

    fn page_image_count(&self, page: u32) -> Result<usize> {
        Ok(self.pdf.images.get(&page).copied().unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Collaborator fakes
// ---------------------------------------------------------------------------

/// In-memory storage.
#[derive(Debug, Default)]
pub struct FakeStorage {
    objects: HashMap<String, Vec<u8>>,
    downloads: AtomicUsize,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.objects.insert(path.to_string(), bytes);
        self
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl Storage for FakeStorage {
    fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ObjectNotFound(path.to_string()))
    }
}

/// One recorded `update_status` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCall {
    pub document_id: String,
    pub status: DocumentStatus,
    pub pages: Option<u32>,
    pub error_message: Option<String>,
}

/// Database that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingDatabase {
    statuses: Mutex<Vec<StatusCall>>,
    saved: Mutex<Vec<ExtractionResult>>,
    fail_status: Option<DocumentStatus>,
    fail_save: bool,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `update_status` call for `status`.
    pub fn failing_status(mut self, status: DocumentStatus) -> Self {
        self.fail_status = Some(status);
        self
    }

    /// Reject every `save_extraction` call.
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn status_calls(&self) -> Vec<StatusCall> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<DocumentStatus> {
        self.status_calls().iter().map(|c| c.status).collect()
    }

    pub fn terminal_calls(&self) -> Vec<StatusCall> {
        self.status_calls()
            .into_iter()
            .filter(|c| c.status.is_terminal())
            .collect()
    }

    pub fn saved(&self) -> Vec<ExtractionResult> {
        self.saved.lock().unwrap().clone()
    }
}

impl Database for RecordingDatabase {
    fn save_extraction(&self, _document_id: &str, result: &ExtractionResult) -> Result<()> {
        if self.fail_save {
            return Err(Error::Database("insert rejected".into()));
        }
        self.saved.lock().unwrap().push(result.clone());
        Ok(())
    }

    fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        pages: Option<u32>,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.statuses.lock().unwrap().push(StatusCall {
            document_id: document_id.to_string(),
            status,
            pages,
            error_message: error_message.map(String::from),
        });
        if self.fail_status == Some(status) {
            return Err(Error::Database(format!("cannot set {}", status)));
        }
        Ok(())
    }
}

/// Number of entries left under `dir`.
pub fn entries_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
