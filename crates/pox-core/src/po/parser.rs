//! Multi-PO parser: segmentation followed by per-block field and
//! line-item extraction.

use std::time::Instant;

use tracing::{debug, info};

use crate::models::config::PoxConfig;
use crate::models::po::{PoBlock, PoRecord};

use super::fields::FieldExtractor;
use super::line_items::LineItemExtractor;
use super::segmenter::BlockSegmenter;
use super::RecordExtractor;

/// Result of parsing one document's text.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Blocks in document order.
    pub blocks: Vec<PoBlock>,
    /// One record per block, same order.
    pub records: Vec<PoRecord>,
    /// Human-readable notes about misses.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Text-to-records parser.
pub struct PoParser {
    segmenter: BlockSegmenter,
    fields: FieldExtractor,
    line_items: LineItemExtractor,
}

impl PoParser {
    /// Parser with default segmentation and matchers.
    pub fn new() -> Self {
        Self::from_config(&PoxConfig::default())
    }

    /// Build from configuration.
    pub fn from_config(config: &PoxConfig) -> Self {
        Self {
            segmenter: BlockSegmenter::from_config(&config.segmentation),
            fields: FieldExtractor::new(),
            line_items: LineItemExtractor::from_config(&config.line_items),
        }
    }

    /// Replace the line-item extractor (e.g. with extra matchers).
    pub fn with_line_items(mut self, line_items: LineItemExtractor) -> Self {
        self.line_items = line_items;
        self
    }

    /// Parse the whole document text.
    pub fn parse(&self, text: &str) -> ParseResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let blocks = self.segmenter.segment(text);
        info!("Parsing {} PO blocks from {} characters", blocks.len(), text.len());

        let records: Vec<PoRecord> = blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let record = self.extract_record(block);

                let missing = record.fields.missing_count();
                if missing > 0 {
                    warnings.push(format!("block {}: {} header fields not found", index, missing));
                }
                if record.line_items.is_empty() {
                    warnings.push(format!("block {}: no line items", index));
                }

                debug!(
                    "Block {} -> PO {} with {} items",
                    index,
                    record.po_number(),
                    record.line_items.len()
                );
                record
            })
            .collect();

        ParseResult {
            blocks,
            records,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

impl Default for PoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor for PoParser {
    fn extract_record(&self, block: &PoBlock) -> PoRecord {
        PoRecord {
            fields: self.fields.extract(&block.raw_text),
            line_items: self.line_items.extract(&block.raw_text),
        }
    }
}
