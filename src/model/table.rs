//! Table types.

use serde::{Deserialize, Serialize};

/// A raw table grid as produced by the PDF backend.
///
/// Rows may be ragged and cells may be missing (`None`); the renderer
/// normalizes both.
pub type RawTable = Vec<Vec<Option<String>>>;

/// One cell of an extracted table, addressed by zero-based row and column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cleaned cell text
    pub text: String,
    /// Zero-based row index (the header row is row 0)
    pub row: usize,
    /// Zero-based column index
    pub col: usize,
}

impl TableCell {
    /// Create a cell at the given position.
    pub fn new(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            text: text.into(),
            row,
            col,
        }
    }
}

/// A table extracted from one page, with its rendered representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// Source page number (1-indexed)
    pub page: u32,

    /// Number of rows, header row included
    pub rows_count: usize,

    /// Width of the first row
    pub cols_count: usize,

    /// Every cell of every row, header row included, in row-major order
    pub cells: Vec<TableCell>,

    /// Cleaned first row
    pub headers: Vec<String>,

    /// Cleaned remaining rows
    pub raw_rows: Vec<Vec<String>>,

    /// HTML `<table>` rendering
    pub html: String,

    /// CSV rendering
    pub csv: String,

    /// Extraction confidence. Text-grid extraction is deterministic, so this is 1.0.
    pub confidence: f32,
}

impl ExtractedTable {
    /// Check whether every row has the header's width.
    pub fn is_rectangular(&self) -> bool {
        self.raw_rows.iter().all(|r| r.len() == self.cols_count)
            && self.headers.len() == self.cols_count
    }

    /// Look up a cell by position.
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}
