//! Document text sourcing: the embedded text layer first, OCR second.
//!
//! OCR runs only when the text layer holds fewer than
//! `min_text_chars` non-whitespace characters (with the default of 1:
//! when it is empty or whitespace-only). Which stage produced the text
//! is reported in [`SourcedText::kind`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::config::{PoxConfig, SourceConfig};
use crate::models::po::PageText;
use crate::ocr::PageRecognizer;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Which stage produced a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSourceKind {
    TextLayer,
    Ocr,
    /// Neither stage produced text; the text is empty.
    Unavailable,
}

impl TextSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSourceKind::TextLayer => "text_layer",
            TextSourceKind::Ocr => "ocr",
            TextSourceKind::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for TextSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text of one document.
#[derive(Debug, Clone)]
pub struct SourcedText {
    /// Per-page text from the stage that won.
    pub pages: Vec<PageText>,
    /// Pages joined with `\n`.
    pub text: String,
    pub kind: TextSourceKind,
    /// Pages in the document, 0 if it could not be opened.
    pub page_count: u32,
}

impl SourcedText {
    fn unavailable(page_count: u32) -> Self {
        Self {
            pages: Vec::new(),
            text: String::new(),
            kind: TextSourceKind::Unavailable,
            page_count,
        }
    }

    fn from_pages(pages: Vec<PageText>, kind: TextSourceKind, page_count: u32) -> Self {
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            pages,
            text,
            kind,
            page_count,
        }
    }
}

fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Two-stage document text source.
pub struct TextSource {
    recognizer: Option<Box<dyn PageRecognizer>>,
    min_text_chars: usize,
}

impl TextSource {
    /// Text layer only.
    pub fn new() -> Self {
        Self {
            recognizer: None,
            min_text_chars: SourceConfig::default().min_text_chars,
        }
    }

    /// Build from configuration, loading the OCR engine when enabled.
    ///
    /// A missing or broken OCR model leaves the source text-layer only.
    pub fn from_config(config: &PoxConfig) -> Self {
        let mut source = Self::new().with_min_text_chars(config.source.min_text_chars);
        if !config.source.enable_ocr {
            debug!("OCR fallback disabled");
            return source;
        }

        #[cfg(feature = "ocr")]
        match crate::ocr::PureOcrEngine::from_config(&config.ocr) {
            Ok(engine) => source.recognizer = Some(Box::new(engine)),
            Err(e) => warn!("OCR fallback unavailable: {}", e),
        }

        #[cfg(not(feature = "ocr"))]
        warn!("OCR fallback requested but pox-core was built without the `ocr` feature");

        source
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn PageRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars.max(1);
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Produce the text of a document. Never fails: an unreadable
    /// document yields empty text with kind `Unavailable`.
    pub fn extract(&self, document: &[u8]) -> SourcedText {
        let extractor = match PdfExtractor::from_bytes(document) {
            Ok(extractor) => extractor,
            Err(e) => {
                warn!("Could not open document: {}", e);
                return SourcedText::unavailable(0);
            }
        };
        let page_count = extractor.page_count();

        let text_layer = match extractor.extract_pages() {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Text layer extraction failed: {}", e);
                Vec::new()
            }
        };
        let layer = SourcedText::from_pages(text_layer, TextSourceKind::TextLayer, page_count);
        let layer_chars = visible_chars(&layer.text);

        if layer_chars >= self.min_text_chars {
            info!("Using text layer: {} pages, {} characters", page_count, layer.text.len());
            return layer;
        }
        debug!(
            "Text layer has {} visible characters (< {}), trying OCR",
            layer_chars, self.min_text_chars
        );

        let Some(recognizer) = self.recognizer.as_deref() else {
            warn!("Text layer empty and no OCR engine configured");
            return Self::fallback(layer, page_count);
        };

        let ocr = self.ocr_pages(&extractor, recognizer, page_count);
        if visible_chars(&ocr.text) == 0 {
            warn!("OCR produced no text");
            return Self::fallback(layer, page_count);
        }

        info!("Using OCR text: {} pages, {} characters", page_count, ocr.text.len());
        ocr
    }

    /// Whatever the text layer had, unless it had nothing at all.
    fn fallback(layer: SourcedText, page_count: u32) -> SourcedText {
        if visible_chars(&layer.text) > 0 {
            layer
        } else {
            SourcedText::unavailable(page_count)
        }
    }

    fn ocr_pages(
        &self,
        extractor: &PdfExtractor,
        recognizer: &dyn PageRecognizer,
        page_count: u32,
    ) -> SourcedText {
        let pages = (1..=page_count)
            .map(|page| {
                let images = extractor.extract_images(page).unwrap_or_else(|e| {
                    warn!("No images on page {}: {}", page, e);
                    Vec::new()
                });

                let texts: Vec<String> = images
                    .iter()
                    .filter_map(|image| match recognizer.recognize_page(image) {
                        Ok(text) => Some(text),
                        Err(e) => {
                            warn!("OCR failed on page {}: {}", page, e);
                            None
                        }
                    })
                    .collect();

                debug!("OCR page {}: {} images", page, images.len());
                PageText {
                    page_index: (page - 1) as usize,
                    text: texts.join("\n"),
                }
            })
            .collect();

        SourcedText::from_pages(pages, TextSourceKind::Ocr, page_count)
    }
}

impl Default for TextSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::pdf::fixtures;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeRecognizer {
        text: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl PageRecognizer for FakeRecognizer {
        fn recognize_page(&self, image: &DynamicImage) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(image.width() > 0);
            Ok(self.text.to_string())
        }
    }

    struct FailingRecognizer;

    impl PageRecognizer for FailingRecognizer {
        fn recognize_page(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Err(OcrError::Recognition("boom".to_string()))
        }
    }

    fn fake(text: &'static str) -> (Box<dyn PageRecognizer>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(FakeRecognizer {
                text,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    #[test]
    fn test_text_layer_wins_without_ocr_call() {
        let (recognizer, calls) = fake("OCR TEXT");
        let source = TextSource::new().with_recognizer(recognizer);

        let pdf = fixtures::text_pdf(&[&["Purchase Order", "Vendor: Acme"]]);
        let sourced = source.extract(&pdf);

        assert_eq!(sourced.kind, TextSourceKind::TextLayer);
        assert_eq!(sourced.page_count, 1);
        assert!(sourced.text.contains("Vendor: Acme"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_image_only_pdf_falls_back_to_ocr() {
        let (recognizer, calls) = fake("Purchase Order\nPO Number: PO-9");
        let source = TextSource::new().with_recognizer(recognizer);

        let sourced = source.extract(&fixtures::image_pdf(8, 8));

        assert_eq!(sourced.kind, TextSourceKind::Ocr);
        assert_eq!(sourced.text, "Purchase Order\nPO Number: PO-9");
        assert_eq!(sourced.pages.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_image_only_pdf_without_ocr_is_unavailable() {
        let sourced = TextSource::new().extract(&fixtures::image_pdf(8, 8));
        assert_eq!(sourced.kind, TextSourceKind::Unavailable);
        assert_eq!(sourced.text, "");
        assert_eq!(sourced.page_count, 1);
    }

    #[test]
    fn test_failing_ocr_degrades_to_empty_text() {
        let source = TextSource::new().with_recognizer(Box::new(FailingRecognizer));
        let sourced = source.extract(&fixtures::image_pdf(8, 8));
        assert_eq!(sourced.kind, TextSourceKind::Unavailable);
        assert!(sourced.text.is_empty());
    }

    #[test]
    fn test_corrupt_document_is_unavailable() {
        let sourced = TextSource::new().extract(b"%PDF-1.4 this is not really a pdf");
        assert_eq!(sourced.kind, TextSourceKind::Unavailable);
        assert_eq!(sourced.page_count, 0);
        assert!(sourced.text.is_empty());
    }

    #[test]
    fn test_threshold_keeps_short_layer_when_ocr_is_empty() {
        let (recognizer, _) = fake("   ");
        let source = TextSource::new()
            .with_recognizer(recognizer)
            .with_min_text_chars(1000);

        let pdf = fixtures::text_pdf(&[&["Vendor: Acme"]]);
        let sourced = source.extract(&pdf);
        assert_eq!(sourced.kind, TextSourceKind::TextLayer);
        assert!(sourced.text.contains("Acme"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TextSourceKind::TextLayer).unwrap(), "\"text_layer\"");
        assert_eq!(TextSourceKind::Ocr.to_string(), "ocr");
    }

    #[test]
    fn test_ocr_disabled_in_config() {
        let mut config = PoxConfig::default();
        config.source.enable_ocr = false;
        assert!(!TextSource::from_config(&config).has_ocr());
    }
}
