//! The per-request extraction pipeline.
//!
//! A request owns its document bytes; the pipeline owns only
//! configuration. Nothing is shared or cached between runs.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::config::PoxConfig;
use crate::models::po::{PoBlock, PoRecord};
use crate::output::Artifacts;
use crate::pdf::{AnnotationOutcome, AnnotationTarget, Annotator};
use crate::po::PoParser;
use crate::source::{TextSource, TextSourceKind};

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Display name, usually the file name.
    pub name: String,
    pub document: Vec<u8>,
}

impl ExtractionRequest {
    pub fn new(name: impl Into<String>, document: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let document = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, document))
    }
}

/// Annotation diagnostics without the document bytes.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSummary {
    pub applied: bool,
    pub marks: usize,
    pub misses: Vec<String>,
}

impl From<&AnnotationOutcome> for AnnotationSummary {
    fn from(outcome: &AnnotationOutcome) -> Self {
        Self {
            applied: outcome.applied,
            marks: outcome.marks,
            misses: outcome.misses.clone(),
        }
    }
}

/// Everything produced for one request.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub name: String,
    pub source: TextSourceKind,
    pub page_count: u32,
    /// Text the records were parsed from.
    pub text: String,
    pub blocks: Vec<PoBlock>,
    /// One record per block, in block order.
    pub records: Vec<PoRecord>,
    pub warnings: Vec<String>,
    pub annotation: AnnotationOutcome,
    pub processing_time_ms: u64,
}

impl ExtractionReport {
    pub fn item_count(&self) -> usize {
        self.records.iter().map(|r| r.line_items.len()).sum()
    }

    pub fn annotation_summary(&self) -> AnnotationSummary {
        AnnotationSummary::from(&self.annotation)
    }

    /// Serialize the four output artifacts.
    pub fn artifacts(&self, config: &PoxConfig) -> Result<Artifacts> {
        Ok(Artifacts::build(
            &self.records,
            self.annotation.document.clone(),
            config.output.table_format,
        )?)
    }
}

/// Source → segment → extract → annotate.
pub struct Pipeline {
    source: TextSource,
    parser: PoParser,
    annotator: Annotator,
    annotate: bool,
}

impl Pipeline {
    /// Build every stage from configuration, loading OCR models if enabled.
    pub fn from_config(config: &PoxConfig) -> Self {
        Self::with_source(TextSource::from_config(config), config)
    }

    /// Build with a caller-supplied text source.
    pub fn with_source(source: TextSource, config: &PoxConfig) -> Self {
        if !config.annotation.first_block_only {
            warn!(
                "annotation.first_block_only=false is not supported; annotating the first block only"
            );
        }
        Self {
            source,
            parser: PoParser::from_config(config),
            annotator: Annotator::from_config(&config.annotation),
            annotate: config.annotation.enabled,
        }
    }

    pub fn with_parser(mut self, parser: PoParser) -> Self {
        self.parser = parser;
        self
    }

    /// Run one request. Never fails: every degraded stage resolves to
    /// sentinels, empty item lists, or an unannotated copy.
    pub fn run(&self, request: &ExtractionRequest) -> ExtractionReport {
        let start = Instant::now();
        info!("Processing {} ({} bytes)", request.name, request.document.len());

        let sourced = self.source.extract(&request.document);
        info!("Text source: {}", sourced.kind);

        let parsed = self.parser.parse(&sourced.text);

        // Only block 0 is annotated, against the original page geometry.
        let annotation = match parsed.records.first() {
            Some(first) if self.annotate => {
                let targets = AnnotationTarget::from_record(first);
                self.annotator.annotate(&request.document, &targets)
            }
            _ => AnnotationOutcome::unmodified(&request.document),
        };

        let report = ExtractionReport {
            name: request.name.clone(),
            source: sourced.kind,
            page_count: sourced.page_count,
            text: sourced.text,
            blocks: parsed.blocks,
            records: parsed.records,
            warnings: parsed.warnings,
            annotation,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "{}: {} blocks, {} line items, {} marks in {}ms",
            report.name,
            report.blocks.len(),
            report.item_count(),
            report.annotation.marks,
            report.processing_time_ms
        );
        report
    }
}

/// Run one request with a fresh pipeline.
pub fn run(
    request: &ExtractionRequest,
    source: TextSource,
    config: &PoxConfig,
) -> ExtractionReport {
    Pipeline::with_source(source, config).run(request)
}
