//! Purchase-order data models.
//!
//! Every entity here is a request-scoped value object: created once per
//! upload, never mutated after extraction, serialized at the end.

use serde::{Deserialize, Serialize};

/// Sentinel stored in place of a header field whose pattern did not match.
pub const NOT_FOUND: &str = "Not Found";

/// Text of one page, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Page index (0-based).
    pub page_index: usize,
    /// Raw text for the page.
    pub text: String,
}

/// A contiguous span of text attributed to a single embedded PO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoBlock {
    /// Trimmed block text. Starts with the marker phrase unless it is the
    /// preamble before the first marker.
    pub raw_text: String,
}

impl PoBlock {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

/// The five fixed header keys, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    PoNumber,
    Vendor,
    Address,
    Date,
    TotalAmount,
}

impl FieldKey {
    /// All keys in table column order.
    pub const ALL: [FieldKey; 5] = [
        FieldKey::PoNumber,
        FieldKey::Vendor,
        FieldKey::Address,
        FieldKey::Date,
        FieldKey::TotalAmount,
    ];

    /// Column / JSON key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::PoNumber => "PO_Number",
            FieldKey::Vendor => "Vendor",
            FieldKey::Address => "Address",
            FieldKey::Date => "Date",
            FieldKey::TotalAmount => "Total_Amount",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PO header fields. All five keys are always present; unmatched ones
/// hold [`NOT_FOUND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    #[serde(rename = "PO_Number")]
    pub po_number: String,

    #[serde(rename = "Vendor")]
    pub vendor: String,

    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "Date")]
    pub date: String,

    /// Thousands separators stripped, decimal point kept.
    #[serde(rename = "Total_Amount")]
    pub total_amount: String,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            po_number: NOT_FOUND.to_string(),
            vendor: NOT_FOUND.to_string(),
            address: NOT_FOUND.to_string(),
            date: NOT_FOUND.to_string(),
            total_amount: NOT_FOUND.to_string(),
        }
    }
}

impl HeaderFields {
    /// Value for a key.
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::PoNumber => &self.po_number,
            FieldKey::Vendor => &self.vendor,
            FieldKey::Address => &self.address,
            FieldKey::Date => &self.date,
            FieldKey::TotalAmount => &self.total_amount,
        }
    }

    /// Mutable slot for a key.
    pub fn slot_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::PoNumber => &mut self.po_number,
            FieldKey::Vendor => &mut self.vendor,
            FieldKey::Address => &mut self.address,
            FieldKey::Date => &mut self.date,
            FieldKey::TotalAmount => &mut self.total_amount,
        }
    }

    /// Iterate `(key, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        FieldKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// Values that were actually found.
    pub fn found_values(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(_, v)| v).filter(|v| *v != NOT_FOUND)
    }

    /// Number of fields holding the sentinel.
    pub fn missing_count(&self) -> usize {
        self.iter().filter(|(_, v)| *v == NOT_FOUND).count()
    }
}

/// One row of a PO's item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "Description")]
    pub description: String,

    /// Non-negative integer, as printed.
    #[serde(rename = "Quantity")]
    pub quantity: String,

    /// Decimal with two fraction digits, separators stripped.
    #[serde(rename = "Unit_Price")]
    pub unit_price: String,

    /// Always `quantity * unit_price`, never read from the source line.
    #[serde(rename = "Total_Price")]
    pub total_price: String,
}

/// One extracted purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoRecord {
    #[serde(rename = "PO_Fields")]
    pub fields: HeaderFields,

    #[serde(rename = "Line_Items")]
    pub line_items: Vec<LineItem>,
}

impl PoRecord {
    /// Identifier of the owning PO (may be the sentinel).
    pub fn po_number(&self) -> &str {
        &self.fields.po_number
    }
}
