//! Positioned text extraction from PDF content streams.
//!
//! Only what line reconstruction needs is tracked: the text and line
//! matrices, the leading, the graphics CTM and the current font. Shown
//! bytes are decoded through the font's `/Encoding` or `ToUnicode` map.
//! Glyph widths are not measured, so consecutive shows without a
//! repositioning operator share an origin and keep their stream order.

use std::collections::BTreeMap;

use lopdf::content::Operation;
use lopdf::{Document, Encoding, Object, ObjectId};

use cuadre_core::Statement;

use crate::error::ImportError;
use crate::layout::{read_layout, LayoutDocument, LayoutOptions, Page, TextRun};
use crate::util::latin1;

/// `[a b c d e f]` affine matrix in PDF operand order.
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// TJ adjustments at or below this (thousandths of an em) read as a space.
const TJ_SPACE_THRESHOLD: f64 = -250.0;

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

/// Decode a PDF string without font information: UTF-16BE when it carries
/// a byte-order mark, Latin-1 otherwise.
pub fn decode_text(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(body) => {
            let units = body.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        None => latin1(bytes),
    }
}

/// Text encodings of the fonts a page references, keyed by resource name.
#[derive(Debug, Default)]
pub struct PageFonts<'a> {
    encodings: BTreeMap<Vec<u8>, Encoding<'a>>,
}

impl<'a> PageFonts<'a> {
    pub fn load(doc: &'a Document, page_id: ObjectId) -> Self {
        let mut encodings = BTreeMap::new();
        let fonts = match doc.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                tracing::warn!("PDF page fonts unreadable: {e}");
                return PageFonts { encodings };
            }
        };

        for (name, font) in fonts {
            if !font.type_is(b"Font") {
                continue;
            }
            match font.get_font_encoding(doc) {
                Ok(encoding) => {
                    encodings.insert(name, encoding);
                }
                Err(e) => tracing::debug!("font {} has no usable encoding: {e}", String::from_utf8_lossy(&name)),
            }
        }
        PageFonts { encodings }
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    /// Decode shown bytes with `font`'s encoding. Unknown fonts and
    /// encodings lopdf cannot map fall back to [`decode_text`].
    pub fn decode(&self, font: Option<&[u8]>, bytes: &[u8]) -> String {
        font.and_then(|name| self.encodings.get(name))
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| decode_text(bytes))
    }
}

struct TextState<'f, 'a> {
    fonts: &'f PageFonts<'a>,
    font: Option<Vec<u8>>,
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    leading: f64,
    runs: Vec<TextRun>,
}

impl<'f, 'a> TextState<'f, 'a> {
    fn new(fonts: &'f PageFonts<'a>) -> Self {
        TextState {
            fonts,
            font: None,
            ctm: IDENTITY,
            saved: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
            runs: Vec::new(),
        }
    }

    fn string_operand(&self, obj: &Object) -> Option<String> {
        match obj {
            Object::String(bytes, _) => Some(self.fonts.decode(self.font.as_deref(), bytes)),
            _ => None,
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let origin = multiply(&self.tm, &self.ctm);
        self.runs.push(TextRun { x: origin[4], y: origin[5], text });
    }

    fn apply(&mut self, op: &Operation) {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.tlm = m;
                    self.tm = m;
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    self.leading = leading;
                }
            }
            "Tf" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.font = Some(name.to_vec());
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(|o| self.string_operand(o)) {
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = operands.first().and_then(|o| self.string_operand(o)) {
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(text) = operands.get(2).and_then(|o| self.string_operand(o)) {
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(..) => text.extend(self.string_operand(item)),
                            other => {
                                if number(other).is_some_and(|n| n <= TJ_SPACE_THRESHOLD) {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    self.show(text);
                }
            }
            _ => {}
        }
    }
}

/// Runs of one decoded content stream, shown with the page's fonts.
pub fn runs_from_operations(operations: &[Operation], fonts: &PageFonts) -> Vec<TextRun> {
    let mut state = TextState::new(fonts);
    for op in operations {
        state.apply(op);
    }
    state.runs
}

/// Load a PDF and collect the positioned text runs of every page.
///
/// A document that cannot be parsed at all is a format error; a page whose
/// content stream cannot be decoded is skipped with a warning.
pub fn extract_runs(data: &[u8]) -> Result<LayoutDocument, ImportError> {
    let doc = Document::load_mem(data).map_err(|e| ImportError::Format(format!("PDF: {e}")))?;

    let mut pages = Vec::new();
    for (number, page_id) in doc.get_pages() {
        match doc.get_and_decode_page_content(page_id) {
            Ok(content) => {
                let fonts = PageFonts::load(&doc, page_id);
                pages.push(Page { runs: runs_from_operations(&content.operations, &fonts) });
            }
            Err(e) => tracing::warn!(page = number, "PDF page content unreadable, skipped: {e}"),
        }
    }

    tracing::debug!("extracted text from {} PDF page(s)", pages.len());
    Ok(LayoutDocument { pages })
}

/// Card statement PDF → local and foreign statements.
pub fn parse_visa_itau(data: &[u8]) -> Result<Vec<Statement>, ImportError> {
    let doc = extract_runs(data)?;
    read_layout(&doc, &LayoutOptions::default())
}
