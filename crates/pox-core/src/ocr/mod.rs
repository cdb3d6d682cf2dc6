//! OCR fallback for pages without a text layer.
//!
//! The text source only needs "image in, text out"; [`PageRecognizer`]
//! is that seam. [`PureOcrEngine`] implements it with `pure-onnx-ocr`
//! when the `ocr` feature is enabled.

#[cfg(feature = "ocr")]
mod pure_engine;

#[cfg(feature = "ocr")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Recognizes the text on one page image.
pub trait PageRecognizer {
    /// Text in reading order, lines separated by `\n`.
    fn recognize_page(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognized text box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4), image
    /// coordinates with y growing downwards.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    fn center_y(&self) -> f32 {
        let (_, y0, _, y1) = self.rect();
        (y0 + y1) / 2.0
    }
}

/// Join boxes into text lines: top to bottom, left to right.
///
/// Boxes whose vertical centre lies within half a box height of a row's
/// first box are on that row and are joined with a space, so table cells
/// recognized separately come back as one line.
pub fn reading_order_text(boxes: &[TextBox]) -> String {
    let mut sorted: Vec<&TextBox> = boxes.iter().filter(|b| !b.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut rows: Vec<Vec<&TextBox>> = Vec::new();
    for text_box in sorted {
        let joins_last = rows.last().and_then(|row| row.first()).is_some_and(|first| {
            let (_, y0, _, y1) = first.rect();
            (text_box.center_y() - first.center_y()).abs() <= (y1 - y0) / 2.0
        });
        match rows.last_mut() {
            Some(row) if joins_last => row.push(text_box),
            _ => rows.push(vec![text_box]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
            row.iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(text: &str, x: f32, y: f32, w: f32) -> TextBox {
        TextBox {
            bbox: [x, y, x + w, y, x + w, y + 20.0, x, y + 20.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_rect() {
        let b = text_box("x", 10.0, 5.0, 30.0);
        assert_eq!(b.rect(), (10.0, 5.0, 40.0, 25.0));
    }

    #[test]
    fn test_cells_on_one_row_are_joined() {
        let boxes = vec![
            text_box("2.50", 300.0, 102.0, 40.0),
            text_box("Purchase Order", 10.0, 40.0, 150.0),
            text_box("Bolt", 10.0, 100.0, 40.0),
            text_box("50", 200.0, 98.0, 20.0),
        ];
        assert_eq!(reading_order_text(&boxes), "Purchase Order\nBolt 50 2.50");
    }

    #[test]
    fn test_blank_boxes_are_dropped() {
        let boxes = vec![
            text_box("  ", 0.0, 0.0, 10.0),
            text_box("Vendor: Acme", 0.0, 50.0, 100.0),
        ];
        assert_eq!(reading_order_text(&boxes), "Vendor: Acme");
        assert_eq!(reading_order_text(&[]), "");
    }
}
