//! Common regex patterns for purchase-order extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Header labels. Each field takes the first match in the block.
    // A PO number holds at least one digit, so `PO Notes:` is not a label.
    pub static ref PO_NUMBER: Regex = Regex::new(
        r"(?i)\bPO\b\s*(?:Number\b|No\b\.?|#)?[:\s]*([A-Z0-9-]*\d[A-Z0-9-]*)"
    ).unwrap();

    pub static ref VENDOR: Regex = Regex::new(
        r"(?i)\bVendor[:\s]*(.+)"
    ).unwrap();

    pub static ref ADDRESS: Regex = Regex::new(
        r"(?i)\bAddress[:\s]*(.+)"
    ).unwrap();

    pub static ref DATE: Regex = Regex::new(
        r"(?i)\bDate[:\s]*([\d-]+)"
    ).unwrap();

    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i)\bTotal\s*Amount[:\s₹$€£Rs.]*(\d[\d,]*\.\d{2})"
    ).unwrap();

    // Line items: `1. Widget - Qty: 3 - Unit Price: ₹10.00`
    pub static ref LABELED_ITEM: Regex = Regex::new(
        r"(?i)^(?:\d+\.\s*)?(.*?)\s*[-–—]\s*Qty[:\s]*(\d+)\s*[-–—]\s*(?:Unit\s*Price|Price)[:\s₹$€£Rs.]*(\d[\d,]*\.\d{2})"
    ).unwrap();

    // Line items: `Bolt 50 2.50`
    pub static ref TABULAR_ITEM: Regex = Regex::new(
        r"(?i)^([A-Za-z0-9\s\-.]+)\s+(\d{1,3})\s+[₹$€£Rs.:\s]*(\d[\d,]*\.\d{2})"
    ).unwrap();

    // A whole delimited cell holding an amount, with optional currency noise.
    pub static ref AMOUNT_CELL: Regex = Regex::new(
        r"(?i)^[₹$€£Rs.:\s]*(\d[\d,]*\.\d{2})$"
    ).unwrap();

    pub static ref INTEGER_CELL: Regex = Regex::new(
        r"^\d+$"
    ).unwrap();

    // Ordinal marker such as `3. ` at the start of an item row.
    pub static ref ORDINAL_PREFIX: Regex = Regex::new(
        r"^(\d+)\.(\s*)"
    ).unwrap();

    pub static ref ORDINAL_CELL: Regex = Regex::new(
        r"^\d+\.?$"
    ).unwrap();
}

/// Byte length of a leading ordinal marker (`"3. "`), if the line has one.
///
/// `"10.00"` is a number, not an ordinal: a dot directly followed by a
/// digit does not count.
pub fn ordinal_len(line: &str) -> Option<usize> {
    let caps = ORDINAL_PREFIX.captures(line)?;
    let end = caps.get(0)?.end();
    let spacing = caps.get(2).map_or(0, |m| m.len());

    if spacing == 0 && line[end..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(end)
}

/// Whether the line opens a new numbered item.
pub fn starts_with_ordinal(line: &str) -> bool {
    ordinal_len(line).is_some()
}

/// Remove a leading ordinal marker and surrounding whitespace.
pub fn strip_ordinal(text: &str) -> &str {
    let text = text.trim();
    match ordinal_len(text) {
        Some(len) => text[len..].trim(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_detection() {
        assert!(starts_with_ordinal("1. Widget"));
        assert!(starts_with_ordinal("12.Gadget"));
        assert!(starts_with_ordinal("3."));
        assert!(!starts_with_ordinal("10.00 shipping"));
        assert!(!starts_with_ordinal("Widget 1."));
        assert!(!starts_with_ordinal("2024-01-05"));
    }

    #[test]
    fn test_strip_ordinal() {
        assert_eq!(strip_ordinal("3. Widget"), "Widget");
        assert_eq!(strip_ordinal("  7.  Long bolt "), "Long bolt");
        assert_eq!(strip_ordinal("3.5mm Bolt"), "3.5mm Bolt");
        assert_eq!(strip_ordinal("Widget"), "Widget");
    }

    #[test]
    fn test_po_number_requires_standalone_label() {
        assert!(PO_NUMBER.captures("Vendor: Polar Inc").is_none());
        assert_eq!(&PO_NUMBER.captures("PO Number: PO-100").unwrap()[1], "PO-100");
        assert_eq!(&PO_NUMBER.captures("po no. 4471").unwrap()[1], "4471");
        assert_eq!(&PO_NUMBER.captures("PO# A-77").unwrap()[1], "A-77");
        assert_eq!(&PO_NUMBER.captures("PO Notes: rush\nPO Number: PO-7").unwrap()[1], "PO-7");
    }

    #[test]
    fn test_total_amount_noise() {
        let caps = TOTAL_AMOUNT.captures("Total Amount: Rs. 1,234.50").unwrap();
        assert_eq!(&caps[1], "1,234.50");

        let caps = TOTAL_AMOUNT.captures("TOTAL AMOUNT ₹ 99.00").unwrap();
        assert_eq!(&caps[1], "99.00");
    }
}
