//! Splits a document's text into one block per embedded purchase order.
//!
//! Concatenated POs carry no structural delimiter besides their repeated
//! heading, so boundaries are purely lexical: every occurrence of the
//! marker phrase starts a new block and stays attached to it.

use regex::Regex;
use tracing::debug;

use crate::models::config::{SegmentMode, SegmentationConfig};
use crate::models::po::PoBlock;

/// Marker-based block segmenter.
pub struct BlockSegmenter {
    boundary: Regex,
}

impl BlockSegmenter {
    /// Segmenter splitting inline at every "Purchase Order".
    pub fn new() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }

    /// Build from configuration.
    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::with_marker(&config.marker, config.mode)
    }

    /// Build for an arbitrary marker phrase, matched case-insensitively.
    pub fn with_marker(marker: &str, mode: SegmentMode) -> Self {
        let escaped = regex::escape(marker.trim());
        let pattern = match mode {
            SegmentMode::Inline => format!("(?i){}", escaped),
            SegmentMode::LineStart => format!(r"(?im)^[ \t]*{}", escaped),
        };
        // An escaped literal always compiles.
        let boundary = Regex::new(&pattern).unwrap_or_else(|_| Regex::new("$^").unwrap());
        Self { boundary }
    }

    /// Split `text` into trimmed, non-empty blocks in document order.
    ///
    /// Text without any marker becomes a single block. Empty or
    /// whitespace-only text yields one empty block so that downstream
    /// extraction still emits a (sentinel-only) record.
    pub fn segment(&self, text: &str) -> Vec<PoBlock> {
        let mut cuts: Vec<usize> = self
            .boundary
            .find_iter(text)
            .map(|m| m.start())
            .filter(|&start| start > 0)
            .collect();
        cuts.dedup();

        let mut blocks = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(text.len())) {
            let segment = text[start..cut].trim();
            if !segment.is_empty() {
                blocks.push(PoBlock::new(segment));
            }
            start = cut;
        }

        if blocks.is_empty() {
            blocks.push(PoBlock::new(""));
        }

        debug!("Segmented {} chars into {} blocks", text.len(), blocks.len());
        blocks
    }
}

impl Default for BlockSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
