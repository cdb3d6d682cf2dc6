//! PDF processing module.

mod annotate;
mod extractor;
pub mod geometry;

#[cfg(test)]
pub(crate) mod fixtures;

pub use annotate::{AnnotationOutcome, AnnotationTarget, Annotator, MarkKind};
pub use extractor::PdfExtractor;
pub use geometry::{PageGeometry, Rect, TextHit};

use crate::error::PdfError;
use crate::models::po::PageText;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text layer, one entry per page in page order.
    fn extract_pages(&self) -> Result<Vec<PageText>>;

    /// Extract embedded images from a page (1-based).
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}
