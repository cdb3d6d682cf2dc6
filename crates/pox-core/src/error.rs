//! Error types for the pox-core library.
//!
//! Extraction misses are not errors: they resolve to the `Not Found`
//! sentinel or to "no row". The variants below cover genuine I/O and
//! document-level failures only.

use thiserror::Error;

/// Main error type for the pox library.
#[derive(Error, Debug)]
pub enum PoxError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Artifact serialization error.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract the text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// Failed to attach annotations or write the annotated copy.
    #[error("failed to annotate PDF: {0}")]
    Annotation(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised while serializing output artifacts.
#[derive(Error, Debug)]
pub enum OutputError {
    /// CSV writer error.
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    /// XLSX writer error.
    #[error("XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Zip bundle error.
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON writer error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while assembling an in-memory artifact.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the pox library.
pub type Result<T> = std::result::Result<T, PoxError>;
