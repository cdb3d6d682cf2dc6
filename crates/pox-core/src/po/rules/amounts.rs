//! Amount normalization for purchase orders.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Strip thousands separators, keeping the decimal point.
pub fn strip_thousands(s: &str) -> String {
    s.chars().filter(|c| *c != ',').collect()
}

/// Parse a dot-decimal amount such as `"1,234.50"`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&strip_thousands(s.trim())).ok()
}

/// Format an amount with exactly two fraction digits.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Compute `quantity * unit_price` formatted to two decimals.
///
/// Returns `None` when either side does not parse or the product
/// overflows.
pub fn line_total(quantity: &str, unit_price: &str) -> Option<String> {
    let quantity = Decimal::from_str(quantity.trim()).ok()?;
    let unit_price = parse_amount(unit_price)?;
    quantity.checked_mul(unit_price).map(format_amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_thousands() {
        assert_eq!(strip_thousands("1,234,567.89"), "1234567.89");
        assert_eq!(strip_thousands("10.00"), "10.00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.50"), Some(Decimal::from_str("1234.50").unwrap()));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total("3", "10.00").as_deref(), Some("30.00"));
        assert_eq!(line_total("50", "2.50").as_deref(), Some("125.00"));
        assert_eq!(line_total("2", "1,000.05").as_deref(), Some("2000.10"));
        assert_eq!(line_total("0", "9.99").as_deref(), Some("0.00"));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let huge = "9".repeat(40);
        assert_eq!(line_total(&huge, "1.00"), None);
    }
}
