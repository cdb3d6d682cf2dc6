//! Purchase-order extraction: segmentation, header fields, line items.

pub mod fields;
pub mod line_items;
mod parser;
pub mod rules;
pub mod segmenter;

pub use fields::FieldExtractor;
pub use line_items::{
    DelimitedMatcher, LabeledMatcher, LineItemExtractor, LineMatcher, RawItem, TabularMatcher,
};
pub use parser::{ParseResult, PoParser};
pub use segmenter::BlockSegmenter;

use crate::models::po::{PoBlock, PoRecord};

/// Trait for per-block record extractors.
pub trait RecordExtractor {
    /// Extract one record from one block. Never fails: misses become
    /// sentinels or missing rows.
    fn extract_record(&self, block: &PoBlock) -> PoRecord;
}
