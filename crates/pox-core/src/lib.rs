//! Core library for multi purchase-order PDF extraction.
//!
//! This crate provides:
//! - Text sourcing from the PDF text layer with an OCR fallback
//! - Segmentation of concatenated POs into per-PO blocks
//! - Header field and line-item extraction with pluggable matchers
//! - Annotation of the first PO's values on the original pages
//! - Table, JSON and zip artifact writers

pub mod error;
pub mod models;
pub mod ocr;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod po;
pub mod source;

pub use error::{PoxError, Result};
pub use models::config::PoxConfig;
pub use models::po::{FieldKey, HeaderFields, LineItem, NOT_FOUND, PageText, PoBlock, PoRecord};
pub use ocr::PageRecognizer;
pub use output::{Artifact, Artifacts};
pub use pdf::{AnnotationOutcome, AnnotationTarget, Annotator, PdfProcessor};
pub use pipeline::{ExtractionReport, ExtractionRequest, Pipeline};
pub use po::{LineMatcher, PoParser, RecordExtractor};
pub use source::{SourcedText, TextSource, TextSourceKind};
