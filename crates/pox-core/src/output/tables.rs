//! Tabular projections of extracted records.

use crate::models::po::{FieldKey, PoRecord};

/// Column headers of the line-items table.
pub const LINE_ITEM_HEADERS: [&str; 5] =
    ["Description", "Quantity", "Unit_Price", "Total_Price", "PO_Number"];

/// A header row plus string rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row per record with the five header fields.
pub fn fields_table(records: &[PoRecord]) -> Table {
    Table {
        headers: FieldKey::ALL.iter().map(|k| k.as_str()).collect(),
        rows: records
            .iter()
            .map(|r| r.fields.iter().map(|(_, v)| v.to_string()).collect())
            .collect(),
    }
}

/// One row per line item across all records, tagged with the owning
/// record's `PO_Number` (copied verbatim, sentinel included).
pub fn line_items_table(records: &[PoRecord]) -> Table {
    Table {
        headers: LINE_ITEM_HEADERS.to_vec(),
        rows: records
            .iter()
            .flat_map(|record| {
                record.line_items.iter().map(move |item| {
                    vec![
                        item.description.clone(),
                        item.quantity.clone(),
                        item.unit_price.clone(),
                        item.total_price.clone(),
                        record.po_number().to_string(),
                    ]
                })
            })
            .collect(),
    }
}
