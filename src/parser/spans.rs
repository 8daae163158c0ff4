//! Positioned text spans from page content streams.
//!
//! The table detector needs to know where each piece of text sits on the
//! page, which plain text extraction throws away. This walks the text
//! operators of a content stream and records one span per show-text
//! operation.

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Default leading used by `T*`, `'` and `"` when no `TL` was seen.
const DEFAULT_LEADING: f32 = 12.0;

/// TJ adjustments beyond this many thousandths of an em are read as word gaps.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new text span, estimating its width from the font size.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Extract positioned spans from one page.
pub fn extract_page_spans(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<TextSpan>> {
    let fonts = doc
        .get_page_fonts(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let decode = |font: &[u8], bytes: &[u8]| -> String {
        fonts
            .get(font)
            .and_then(|f| f.get_font_encoding(doc).ok())
            .and_then(|enc| LopdfDocument::decode_text(&enc, bytes).ok())
            .unwrap_or_else(|| decode_text_simple(bytes))
    };

    let content = page_content(doc, page_id)?;
    parse_content_stream(&content, &decode)
}

/// Get the decompressed content stream of a page.
///
/// Pages with multiple content streams are concatenated in order.
pub(crate) fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        // A page without content is blank, not broken.
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(r) => match doc.get_object(*r) {
            Ok(Object::Stream(s)) => Ok(s
                .decompressed_content()
                .unwrap_or_else(|_| s.content.clone())),
            Ok(Object::Array(arr)) => Ok(concat_streams(doc, arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        },
        Object::Array(arr) => Ok(concat_streams(doc, arr)),
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

fn concat_streams(doc: &LopdfDocument, refs: &[Object]) -> Vec<u8> {
    let mut content = Vec::new();
    for obj in refs {
        if let Object::Reference(r) = obj {
            if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                let data = s.decompressed_content().unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b' ');
            }
        }
    }
    content
}

/// Font-aware string decoder: `(font resource name, raw bytes) -> text`.
type Decoder<'a> = dyn Fn(&[u8], &[u8]) -> String + 'a;

/// Walk content stream operators and collect spans.
fn parse_content_stream(content: &[u8], decode: &Decoder<'_>) -> Result<Vec<TextSpan>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut current_font: Vec<u8> = Vec::new();
    let mut font_size: f32 = 12.0;
    let mut leading: f32 = DEFAULT_LEADING;
    let mut matrix = TextMatrix::default();
    let mut in_text_block = false;

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                matrix = TextMatrix::default();
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        current_font = name.clone();
                    }
                    font_size = get_number(&operands[1]).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(tl) = operands.first().and_then(get_number) {
                    leading = tl;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    matrix.translate(tx, ty);
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    leading = -ty;
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    matrix.set(
                        get_number(&operands[0]).unwrap_or(1.0),
                        get_number(&operands[1]).unwrap_or(0.0),
                        get_number(&operands[2]).unwrap_or(0.0),
                        get_number(&operands[3]).unwrap_or(1.0),
                        get_number(&operands[4]).unwrap_or(0.0),
                        get_number(&operands[5]).unwrap_or(0.0),
                    );
                }
            }
            "T*" => matrix.next_line(leading),
            "Tj" | "TJ" | "'" | "\"" if in_text_block => {
                if op.operator == "'" || op.operator == "\"" {
                    matrix.next_line(leading);
                }
                let decode_str = |bytes: &[u8]| decode(&current_font, bytes);
                let text = match op.operator.as_str() {
                    "TJ" => match operands.first() {
                        Some(Object::Array(items)) => decode_tj_array(items, &decode_str),
                        _ => String::new(),
                    },
                    "\"" => string_operand(operands.get(2), &decode_str),
                    _ => string_operand(operands.first(), &decode_str),
                };

                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    spans.push(TextSpan::new(text, x, y, font_size * matrix.scale()));
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn string_operand(obj: Option<&Object>, decode: &dyn Fn(&[u8]) -> String) -> String {
    match obj {
        Some(Object::String(bytes, _)) => decode(bytes),
        _ => String::new(),
    }
}

/// Decode a TJ array, turning large negative adjustments into word spaces.
fn decode_tj_array(items: &[Object], decode: &dyn Fn(&[u8]) -> String) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(bytes)),
            Object::Integer(_) | Object::Real(_) => {
                let adjustment = -get_number(item).unwrap_or(0.0);
                if adjustment > TJ_SPACE_THRESHOLD
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}')
                {
                    if let Some(c) = combined.chars().last() {
                        if !is_spaceless_script_char(c) {
                            combined.push(' ');
                        }
                    }
                }
            }
            _ => {}
        }
    }
    combined
}

/// Text matrix for tracking position in a content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
    // Start of the current line; Td and T* move relative to this, not to `e`/`f`.
    line_e: f32,
    line_f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, leading: f32) {
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if a character belongs to a script written without word spaces.
///
/// Hangul is deliberately absent: Korean separates words with spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK symbols and punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// Simple text decoding fallback when no font encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
