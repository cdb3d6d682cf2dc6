//! Header field extraction.

use regex::Regex;
use tracing::trace;

use crate::models::po::{FieldKey, HeaderFields};

use super::rules::patterns::{ADDRESS, DATE, PO_NUMBER, TOTAL_AMOUNT, VENDOR};
use super::rules::strip_thousands;

/// Extracts the five PO header fields from one block of text.
///
/// Each field is one case-insensitive search taking the first match.
/// There is no cross-field validation.
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    fn pattern(key: FieldKey) -> &'static Regex {
        match key {
            FieldKey::PoNumber => &PO_NUMBER,
            FieldKey::Vendor => &VENDOR,
            FieldKey::Address => &ADDRESS,
            FieldKey::Date => &DATE,
            FieldKey::TotalAmount => &TOTAL_AMOUNT,
        }
    }

    /// Extract a single field, `None` on a miss.
    pub fn extract_field(&self, key: FieldKey, text: &str) -> Option<String> {
        let caps = Self::pattern(key).captures(text)?;
        let value = caps.get(1)?.as_str().trim();
        if value.is_empty() {
            return None;
        }

        let value = match key {
            FieldKey::TotalAmount => strip_thousands(value),
            _ => value.to_string(),
        };
        trace!("{} -> {:?}", key, value);
        Some(value)
    }

    /// Extract all header fields. Misses hold the `Not Found` sentinel.
    pub fn extract(&self, text: &str) -> HeaderFields {
        let mut fields = HeaderFields::default();
        for key in FieldKey::ALL {
            if let Some(value) = self.extract_field(key, text) {
                *fields.slot_mut(key) = value;
            }
        }
        fields
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}
