//! Line-item extraction.
//!
//! Item rows are recognized by an ordered list of [`LineMatcher`]
//! strategies. The first matcher that accepts a logical line wins; lines
//! no matcher accepts are skipped, since most lines of a PO are not item
//! rows. The total is always computed, never read from the line.

use tracing::{debug, trace};

use crate::models::config::{LineItemConfig, MatcherKind};
use crate::models::po::LineItem;

use super::rules::patterns::{
    AMOUNT_CELL, INTEGER_CELL, LABELED_ITEM, ORDINAL_CELL, TABULAR_ITEM,
};
use super::rules::{line_total, starts_with_ordinal, strip_ordinal, strip_thousands};

/// Fields of an item row as printed, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
}

impl RawItem {
    fn new(description: &str, quantity: &str, unit_price: &str) -> Self {
        Self {
            description: description.to_string(),
            quantity: quantity.to_string(),
            unit_price: unit_price.to_string(),
        }
    }

    /// Normalize into a [`LineItem`]: strip the ordinal from the
    /// description, strip thousands separators from the price and
    /// compute the total.
    pub fn into_line_item(self) -> Option<LineItem> {
        let unit_price = strip_thousands(self.unit_price.trim());
        let total_price = line_total(&self.quantity, &unit_price)?;

        Some(LineItem {
            description: strip_ordinal(&self.description).to_string(),
            quantity: self.quantity.trim().to_string(),
            unit_price,
            total_price,
        })
    }
}

/// A strategy recognizing one item-row layout.
pub trait LineMatcher: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Parse a logical line, `None` if it is not in this layout.
    fn match_line(&self, line: &str) -> Option<RawItem>;
}

/// `1. Widget - Qty: 3 - Unit Price: ₹10.00`
pub struct LabeledMatcher;

impl LineMatcher for LabeledMatcher {
    fn name(&self) -> &'static str {
        "labeled"
    }

    fn match_line(&self, line: &str) -> Option<RawItem> {
        let caps = LABELED_ITEM.captures(line)?;
        Some(RawItem::new(&caps[1], &caps[2], &caps[3]))
    }
}

/// `Bolt 50 2.50`: columnar layouts without field labels.
pub struct TabularMatcher;

impl LineMatcher for TabularMatcher {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn match_line(&self, line: &str) -> Option<RawItem> {
        let caps = TABULAR_ITEM.captures(line)?;
        Some(RawItem::new(&caps[1], &caps[2], &caps[3]))
    }
}

/// `1 | Widget | 3 | pcs | 10.00 | 30.00`: pipe or tab separated cells.
///
/// The description is the first cell with a letter, the quantity the
/// next integer cell and the unit price the next amount cell after it.
/// Trailing cells are ignored.
pub struct DelimitedMatcher;

impl LineMatcher for DelimitedMatcher {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn match_line(&self, line: &str) -> Option<RawItem> {
        if !line.contains(['|', '\t']) {
            return None;
        }

        let cells: Vec<&str> = line
            .split(['|', '\t'])
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if cells.len() < 3 {
            return None;
        }

        let mut rest = cells.iter().copied();
        let description = rest
            .by_ref()
            .find(|c| !ORDINAL_CELL.is_match(c) && c.chars().any(char::is_alphabetic))?;
        let quantity = rest.by_ref().find(|c| INTEGER_CELL.is_match(c))?;
        let unit_price =
            rest.find_map(|c| AMOUNT_CELL.captures(c).map(|caps| caps[1].to_string()))?;

        Some(RawItem::new(description, quantity, &unit_price))
    }
}

impl MatcherKind {
    /// Instantiate the matcher for this pattern family.
    pub fn matcher(&self) -> Box<dyn LineMatcher> {
        match self {
            MatcherKind::Labeled => Box::new(LabeledMatcher),
            MatcherKind::Tabular => Box::new(TabularMatcher),
            MatcherKind::Delimited => Box::new(DelimitedMatcher),
        }
    }
}

/// Extracts item rows from one block of text.
pub struct LineItemExtractor {
    matchers: Vec<Box<dyn LineMatcher>>,
    merge_wrapped_lines: bool,
    max_continuation_lines: usize,
}

impl LineItemExtractor {
    /// Extractor with the default matcher order and line merging.
    pub fn new() -> Self {
        Self::from_config(&LineItemConfig::default())
    }

    /// Build from configuration.
    pub fn from_config(config: &LineItemConfig) -> Self {
        Self {
            matchers: config.matchers.iter().map(MatcherKind::matcher).collect(),
            merge_wrapped_lines: config.merge_wrapped_lines,
            max_continuation_lines: config.max_continuation_lines,
        }
    }

    /// Append a matcher at the lowest priority.
    pub fn with_matcher(mut self, matcher: Box<dyn LineMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Enable or disable the line-merging pass.
    pub fn with_line_merging(mut self, merge: bool) -> Self {
        self.merge_wrapped_lines = merge;
        self
    }

    /// Names of the configured matchers in priority order.
    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Try every matcher in order; first success wins.
    pub fn match_line(&self, line: &str) -> Option<LineItem> {
        self.matchers.iter().find_map(|matcher| {
            let raw = matcher.match_line(line)?;
            trace!("{} matched {:?}", matcher.name(), line);
            raw.into_line_item()
        })
    }

    fn matches_any(&self, line: &str) -> bool {
        self.matchers.iter().any(|m| m.match_line(line).is_some())
    }

    /// Trimmed, non-empty lines, with wrapped item rows joined.
    ///
    /// A line starting with an ordinal marker opens a new row. Following
    /// lines without a marker are appended to it while the row is still
    /// incomplete (no matcher accepts it) and the continuation limit is
    /// not reached; otherwise they stand on their own.
    pub fn logical_lines(&self, text: &str) -> Vec<String> {
        let physical = text.lines().map(str::trim).filter(|l| !l.is_empty());

        if !self.merge_wrapped_lines {
            return physical.map(str::to_string).collect();
        }

        let mut lines = Vec::new();
        let mut buffer: Option<String> = None;
        let mut appended = 0;

        for line in physical {
            if starts_with_ordinal(line) {
                lines.extend(buffer.replace(line.to_string()));
                appended = 0;
                continue;
            }

            match buffer.as_mut() {
                Some(current)
                    if appended < self.max_continuation_lines
                        && !self.matches_any(current.as_str()) =>
                {
                    current.push(' ');
                    current.push_str(line);
                    appended += 1;
                }
                _ => {
                    lines.extend(buffer.take());
                    lines.push(line.to_string());
                }
            }
        }
        lines.extend(buffer);

        lines
    }

    /// Extract item rows in document order.
    pub fn extract(&self, text: &str) -> Vec<LineItem> {
        let items: Vec<LineItem> = self
            .logical_lines(text)
            .iter()
            .filter_map(|line| self.match_line(line))
            .collect();

        debug!("Extracted {} line items", items.len());
        items
    }
}

impl Default for LineItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(description: &str, quantity: &str, unit_price: &str, total_price: &str) -> LineItem {
        LineItem {
            description: description.to_string(),
            quantity: quantity.to_string(),
            unit_price: unit_price.to_string(),
            total_price: total_price.to_string(),
        }
    }

    #[test]
    fn test_labeled_form() {
        let items = LineItemExtractor::new().extract("1. Widget - Qty: 3 - Unit Price: ₹10.00");
        assert_eq!(items, vec![item("Widget", "3", "10.00", "30.00")]);
    }

    #[test]
    fn test_labeled_form_variants() {
        let text = "2. Steel Pipe – Qty 12 – Price: Rs. 1,050.25\n\
                    3. T-Shirt - QTY: 2 - unit price $5.00";
        let items = LineItemExtractor::new().extract(text);

        assert_eq!(
            items,
            vec![
                item("Steel Pipe", "12", "1050.25", "12603.00"),
                item("T-Shirt", "2", "5.00", "10.00"),
            ]
        );
    }

    #[test]
    fn test_tabular_form() {
        let items = LineItemExtractor::new().extract("Bolt 50 2.50");
        assert_eq!(items, vec![item("Bolt", "50", "2.50", "125.00")]);
    }

    #[test]
    fn test_tabular_form_strips_ordinal() {
        let items = LineItemExtractor::new().extract("4. Hex Nut M8 200 ₹0.75");
        assert_eq!(items, vec![item("Hex Nut M8", "200", "0.75", "150.00")]);
    }

    #[test]
    fn test_delimited_form_ignores_printed_total() {
        let items = LineItemExtractor::new().extract("1 | Cable Tie | 100 | pcs | 0.40 | 99.99");
        assert_eq!(items, vec![item("Cable Tie", "100", "0.40", "40.00")]);
    }

    #[test]
    fn test_total_is_computed_not_copied() {
        let items = LineItemExtractor::new()
            .extract("1. Widget - Qty: 4 - Unit Price: 2.50 - Total: 999.00");
        assert_eq!(items[0].total_price, "10.00");
    }

    #[test]
    fn test_non_item_lines_are_skipped() {
        let text =
            "Purchase Order\nPO Number: PO-1\nVendor: Acme\nDate: 2024-01-01\nTotal Amount: 30.00";
        assert!(LineItemExtractor::new().extract(text).is_empty());
    }

    #[test]
    fn test_wrapped_item_is_merged() {
        let text =
            "1. Heavy duty industrial\nwidget - Qty: 2 - Unit Price: 7.50\n2. Bolt - Qty: 1 - Price: 1.00";
        let items = LineItemExtractor::new().extract(text);

        assert_eq!(
            items,
            vec![
                item("Heavy duty industrial widget", "2", "7.50", "15.00"),
                item("Bolt", "1", "1.00", "1.00"),
            ]
        );
    }

    #[test]
    fn test_complete_item_is_not_extended() {
        let extractor = LineItemExtractor::new();
        let lines =
            extractor.logical_lines("1. Widget - Qty: 3 - Unit Price: 10.00\nTotal Amount: 30.00");
        assert_eq!(
            lines,
            vec![
                "1. Widget - Qty: 3 - Unit Price: 10.00".to_string(),
                "Total Amount: 30.00".to_string(),
            ]
        );
    }

    #[test]
    fn test_continuation_limit() {
        let extractor = LineItemExtractor::new();
        let lines = extractor.logical_lines("1. a\nb\nc\nd");
        assert_eq!(lines, vec!["1. a b c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_merging_disabled() {
        let extractor = LineItemExtractor::new().with_line_merging(false);
        let text = "1. Heavy duty\nwidget - Qty: 2 - Unit Price: 7.50";
        let items = extractor.extract(text);
        assert_eq!(items, vec![item("widget", "2", "7.50", "15.00")]);
    }

    #[test]
    fn test_priority_order_is_configurable() {
        let config = LineItemConfig {
            matchers: vec![MatcherKind::Delimited],
            ..LineItemConfig::default()
        };
        let extractor = LineItemExtractor::from_config(&config);

        assert_eq!(extractor.matcher_names(), vec!["delimited"]);
        assert!(extractor.extract("Bolt 50 2.50").is_empty());
    }

    struct SkuMatcher;

    impl LineMatcher for SkuMatcher {
        fn name(&self) -> &'static str {
            "sku"
        }

        fn match_line(&self, line: &str) -> Option<RawItem> {
            let rest = line.strip_prefix("SKU=")?;
            let mut parts = rest.split(';');
            Some(RawItem::new(parts.next()?, parts.next()?, parts.next()?))
        }
    }

    #[test]
    fn test_custom_matcher_runs_last() {
        let extractor = LineItemExtractor::new().with_matcher(Box::new(SkuMatcher));
        let items = extractor.extract("SKU=AB-9;x2;3.00\nSKU=CD-1;4;1.25");

        // `x2` is not a quantity, so that row is dropped.
        assert_eq!(items, vec![item("CD-1", "4", "1.25", "5.00")]);
    }
}
