//! Positioned text from page content streams.
//!
//! The text layer extracted for parsing carries no coordinates, so this
//! module interprets each page's content stream independently and keeps
//! a bounding box per glyph. Glyphs sharing a baseline are joined into
//! lines, and [`PageGeometry::locate`] maps a literal string back to the
//! boxes it occupies. The two text paths may tokenize differently, so a
//! lookup that finds nothing is an expected outcome.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::Result;
use crate::error::PdfError;

/// Glyph width used when a font has no usable `Widths` array, in text
/// space units per unit of font size.
const DEFAULT_GLYPH_WIDTH: f32 = 0.5;
const COURIER_GLYPH_WIDTH: f32 = 0.6;
const DESCENT: f32 = 0.2;
const ASCENT: f32 = 0.8;
/// Baselines closer than this fraction of the font size share a line.
const LINE_TOLERANCE: f32 = 0.3;
/// Horizontal gaps wider than this fraction of the font size read as a space.
const GAP_AS_SPACE: f32 = 0.15;

/// Axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// `[x0 y0 x1 y1]` as PDF numbers.
    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.x0),
            Object::Real(self.y0),
            Object::Real(self.x1),
            Object::Real(self.y1),
        ])
    }

    /// Quadrilateral in the corner order viewers expect for markup
    /// annotations: upper-left, upper-right, lower-left, lower-right.
    pub fn to_quad_points(&self) -> Object {
        Object::Array(
            [
                self.x0, self.y1, self.x1, self.y1, self.x0, self.y0, self.x1, self.y0,
            ]
            .into_iter()
            .map(Object::Real)
            .collect(),
        )
    }
}

/// One literal occurrence of a searched string.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHit {
    /// 1-based page number.
    pub page: u32,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other` in PDF row-vector convention.
    fn concat(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let mut m = [0.0f32; 6];
        for (slot, operand) in m.iter_mut().zip(operands) {
            *slot = get_number(operand)?;
        }
        Some(Matrix(m))
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    ch: char,
    rect: Rect,
    baseline: f32,
    size: f32,
}

/// Glyph advance widths for one font resource.
#[derive(Debug, Clone)]
struct FontMetrics {
    first_char: i64,
    widths: Vec<f32>,
    missing_width: f32,
    two_byte: bool,
}

impl FontMetrics {
    fn load(doc: &Document, font: &Dictionary) -> Self {
        let base_font = font
            .get(b"BaseFont")
            .and_then(|o| o.as_name())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();
        let two_byte = font
            .get(b"Subtype")
            .and_then(|o| o.as_name())
            .is_ok_and(|n| n == b"Type0");

        let missing_width = if base_font.contains("Courier") {
            COURIER_GLYPH_WIDTH
        } else {
            DEFAULT_GLYPH_WIDTH
        };

        let first_char = font
            .get(b"FirstChar")
            .and_then(|o| o.as_i64())
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, o)| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| get_number(w).unwrap_or(0.0) / 1000.0)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            first_char,
            widths,
            missing_width,
            two_byte,
        }
    }

    fn fallback() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            missing_width: DEFAULT_GLYPH_WIDTH,
            two_byte: false,
        }
    }

    fn width(&self, code: u32) -> f32 {
        let index = code as i64 - self.first_char;
        if index >= 0 {
            if let Some(&w) = self.widths.get(index as usize) {
                if w > 0.0 {
                    return w;
                }
            }
        }
        self.missing_width
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        }
    }
}

struct FontRef<'a> {
    dict: &'a Dictionary,
    metrics: FontMetrics,
}

#[derive(Clone)]
struct GraphicsState {
    ctm: Matrix,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    font: Vec<u8>,
    font_size: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: Vec::new(),
            font_size: 12.0,
        }
    }
}

struct PageInterpreter<'a> {
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, FontRef<'a>>,
    fallback: FontMetrics,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    glyphs: Vec<Glyph>,
}

impl<'a> PageInterpreter<'a> {
    fn new(doc: &'a Document, page_id: ObjectId) -> Self {
        let fonts = doc
            .get_page_fonts(page_id)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, dict)| {
                let metrics = FontMetrics::load(doc, dict);
                (name, FontRef { dict, metrics })
            })
            .collect();

        Self {
            doc,
            fonts,
            fallback: FontMetrics::fallback(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            glyphs: Vec::new(),
        }
    }

    fn run(mut self, content: &Content) -> Vec<Glyph> {
        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => {
                    if let Some(state) = self.stack.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.state.ctm = m.concat(&self.state.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = Matrix::IDENTITY;
                    self.line_matrix = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.state.font = name.to_vec();
                    }
                    if let Some(size) = operands.get(1).and_then(get_number) {
                        self.state.font_size = size;
                    }
                }
                "Tc" => self.set_number(operands, |s, v| s.char_spacing = v),
                "Tw" => self.set_number(operands, |s, v| s.word_spacing = v),
                "Tz" => self.set_number(operands, |s, v| s.horizontal_scale = v / 100.0),
                "TL" => self.set_number(operands, |s, v| s.leading = v),
                "Ts" => self.set_number(operands, |s, v| s.rise = v),
                "Td" | "TD" => {
                    let tx = operands.first().and_then(get_number).unwrap_or(0.0);
                    let ty = operands.get(1).and_then(get_number).unwrap_or(0.0);
                    if op.operator == "TD" {
                        self.state.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes);
                    }
                }
                "\"" => {
                    if let Some(v) = operands.first().and_then(get_number) {
                        self.state.word_spacing = v;
                    }
                    if let Some(v) = operands.get(1).and_then(get_number) {
                        self.state.char_spacing = v;
                    }
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(bytes);
                    }
                }
                "TJ" => {
                    if let Some(Ok(items)) = operands.first().map(|o| o.as_array()) {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(bytes),
                                other => {
                                    if let Some(adjust) = get_number(other) {
                                        let tx = -adjust / 1000.0
                                            * self.state.font_size
                                            * self.state.horizontal_scale;
                                        self.advance(tx);
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        self.glyphs
    }

    fn set_number(&mut self, operands: &[Object], set: impl FnOnce(&mut GraphicsState, f32)) {
        if let Some(v) = operands.first().and_then(get_number) {
            set(&mut self.state, v);
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix = Matrix::translate(tx, 0.0).concat(&self.text_matrix);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(font) = self.fonts.get(&self.state.font) {
            if let Ok(encoding) = font.dict.get_font_encoding(self.doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }

        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect();
            return String::from_utf16_lossy(&utf16);
        }

        bytes.iter().map(|&b| b as char).collect()
    }

    fn show(&mut self, bytes: &[u8]) {
        let text = self.decode(bytes);
        let metrics = self
            .fonts
            .get(&self.state.font)
            .map(|f| f.metrics.clone())
            .unwrap_or_else(|| self.fallback.clone());
        let codes = metrics.codes(bytes);
        let chars: Vec<char> = text.chars().collect();

        let size = self.state.font_size;
        let scale = self.state.horizontal_scale;

        // Per-code advances. When decoding changed the glyph count
        // (ligatures, multi-byte maps) the run's width is spread evenly.
        let advances: Vec<f32> = codes
            .iter()
            .map(|&code| {
                let mut w = metrics.width(code) * size + self.state.char_spacing;
                if !metrics.two_byte && code == 32 {
                    w += self.state.word_spacing;
                }
                w * scale
            })
            .collect();
        let per_char: Vec<f32> = if advances.len() == chars.len() {
            advances
        } else {
            let total: f32 = advances.iter().sum();
            let share = if chars.is_empty() {
                0.0
            } else {
                total / chars.len() as f32
            };
            vec![share; chars.len()]
        };

        for (ch, adv) in chars.into_iter().zip(per_char) {
            let trm = self.text_matrix.concat(&self.state.ctm);
            let rise = self.state.rise;
            let corners = [
                trm.apply(0.0, rise - DESCENT * size),
                trm.apply(adv, rise - DESCENT * size),
                trm.apply(0.0, rise + ASCENT * size),
                trm.apply(adv, rise + ASCENT * size),
            ];
            let rect = corners.iter().skip(1).fold(
                Rect {
                    x0: corners[0].0,
                    y0: corners[0].1,
                    x1: corners[0].0,
                    y1: corners[0].1,
                },
                |r, &(x, y)| Rect {
                    x0: r.x0.min(x),
                    y0: r.y0.min(y),
                    x1: r.x1.max(x),
                    y1: r.y1.max(y),
                },
            );
            let baseline = trm.apply(0.0, rise).1;
            let rendered_size = (trm.apply(0.0, size).1 - trm.apply(0.0, 0.0).1).abs();

            self.glyphs.push(Glyph {
                ch,
                rect,
                baseline,
                size: if rendered_size > 0.0 { rendered_size } else { size },
            });
            self.advance(adv);
        }
    }
}

/// A reconstructed line: its text and one box per char of that text.
#[derive(Debug, Clone)]
struct TextLine {
    text: String,
    boxes: Vec<Rect>,
}

impl TextLine {
    fn from_glyphs(mut glyphs: Vec<Glyph>) -> Self {
        glyphs.sort_by(|a, b| a.rect.x0.total_cmp(&b.rect.x0));

        let mut text = String::new();
        let mut boxes: Vec<Rect> = Vec::new();
        let mut prev: Option<Glyph> = None;

        for glyph in glyphs {
            let is_space = glyph.ch.is_whitespace();
            let last_is_space = text.ends_with(' ');

            if let Some(p) = prev {
                let gap = glyph.rect.x0 - p.rect.x1;
                if gap > GAP_AS_SPACE * glyph.size.max(p.size) && !is_space && !last_is_space {
                    text.push(' ');
                    boxes.push(Rect {
                        x0: p.rect.x1,
                        y0: p.rect.y0.min(glyph.rect.y0),
                        x1: glyph.rect.x0,
                        y1: p.rect.y1.max(glyph.rect.y1),
                    });
                }
            }

            if is_space {
                // Whitespace collapses to one space; leading whitespace is dropped.
                if !text.is_empty() && !last_is_space {
                    text.push(' ');
                    boxes.push(glyph.rect);
                }
            } else {
                text.push(glyph.ch);
                boxes.push(glyph.rect);
            }
            prev = Some(glyph);
        }

        Self { text, boxes }
    }

    /// Boxes of each occurrence of `needle`, one union rect per occurrence.
    fn find(&self, needle: &str) -> Vec<Rect> {
        let char_starts: Vec<usize> = self.text.char_indices().map(|(i, _)| i).collect();
        let char_at = |byte: usize| char_starts.partition_point(|&b| b < byte);

        self.text
            .match_indices(needle)
            .filter_map(|(start, matched)| {
                let first = char_at(start);
                let last = char_at(start + matched.len());
                self.boxes[first..last]
                    .iter()
                    .copied()
                    .reduce(|a, b| a.union(&b))
            })
            .collect()
    }
}

/// Positioned text lines of every page of a document.
#[derive(Debug, Clone, Default)]
pub struct PageGeometry {
    /// (1-based page number, lines top to bottom).
    pages: Vec<(u32, Vec<TextLine>)>,
}

impl PageGeometry {
    /// Interpret every page's content stream.
    ///
    /// Pages whose content cannot be decoded contribute no lines.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        let mut out = Vec::with_capacity(pages.len());
        for (page_num, page_id) in pages {
            let lines = match page_lines(doc, page_id) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("No geometry for page {}: {}", page_num, e);
                    Vec::new()
                }
            };
            trace!("Page {}: {} positioned lines", page_num, lines.len());
            out.push((page_num, lines));
        }

        debug!("Built geometry for {} pages", out.len());
        Ok(Self { pages: out })
    }

    /// Every literal occurrence of `needle`, in page then line order.
    ///
    /// Matching is case-sensitive; runs of whitespace in `needle` match a
    /// single space on the page.
    pub fn locate(&self, needle: &str) -> Vec<TextHit> {
        let needle = needle.split_whitespace().collect::<Vec<_>>().join(" ");
        if needle.is_empty() {
            return Vec::new();
        }

        self.pages
            .iter()
            .flat_map(|(page, lines)| {
                let needle = needle.as_str();
                lines.iter().flat_map(move |line| {
                    line.find(needle)
                        .into_iter()
                        .map(move |rect| TextHit { page: *page, rect })
                })
            })
            .collect()
    }

    /// Reconstructed text of one page, lines joined by newlines.
    pub fn page_text(&self, page: u32) -> Option<String> {
        self.pages.iter().find(|(p, _)| *p == page).map(|(_, lines)| {
            lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

fn page_lines(doc: &Document, page_id: ObjectId) -> Result<Vec<TextLine>> {
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;
    let glyphs = PageInterpreter::new(doc, page_id).run(&content);
    Ok(group_into_lines(glyphs))
}

/// Cluster glyphs by baseline, top of page first.
fn group_into_lines(mut glyphs: Vec<Glyph>) -> Vec<TextLine> {
    glyphs.sort_by(|a, b| b.baseline.total_cmp(&a.baseline));

    let mut lines = Vec::new();
    let mut current: Vec<Glyph> = Vec::new();
    let mut line_baseline = 0.0f32;

    for glyph in glyphs {
        let same_line = current.first().is_some_and(|first| {
            (line_baseline - glyph.baseline).abs() < LINE_TOLERANCE * first.size
        });
        if !same_line {
            if !current.is_empty() {
                lines.push(TextLine::from_glyphs(std::mem::take(&mut current)));
            }
            line_baseline = glyph.baseline;
        }
        current.push(glyph);
    }
    if !current.is_empty() {
        lines.push(TextLine::from_glyphs(current));
    }

    lines.retain(|l| !l.text.trim().is_empty());
    lines
}
