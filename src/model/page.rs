//! Page-level types.

use serde::{Deserialize, Serialize};

/// Extracted content of a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Extracted text; empty when the page has no text layer
    pub text: String,

    /// Number of tables detected on the page
    pub tables_count: usize,

    /// Number of images placed on the page
    pub images_count: usize,
}

impl PageContent {
    /// Create page content with text and no tables or images.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            tables_count: 0,
            images_count: 0,
        }
    }

    /// Check if the page produced no text.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of characters (Unicode scalar values) in the page text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
