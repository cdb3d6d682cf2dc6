//! CSV, XLSX and JSON serialization.
//!
//! Every writer is deterministic: identical input gives identical bytes.

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::OutputError;

use super::tables::Table;

/// Width cap for XLSX columns, in characters.
const MAX_COLUMN_WIDTH: usize = 60;

pub fn table_to_csv(table: &Table) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| OutputError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
}

/// Drop characters that cannot appear in sheet XML.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            matches!(c, '\t' | '\n' | '\r')
                || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

fn set_column_widths(worksheet: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    for (col, header) in table.headers.iter().enumerate() {
        let widest = table
            .rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.chars().count())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0)
            .min(MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, (widest + 2) as f64)?;
    }
    Ok(())
}

/// One worksheet, bold header row, text cells.
pub fn table_to_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, OutputError> {
    let mut workbook = Workbook::new();

    // A fixed creation date keeps the output reproducible.
    let properties =
        DocProperties::new().set_creation_datetime(&ExcelDateTime::from_ymd(2000, 1, 1)?);
    workbook.set_properties(&properties);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col as u16, &sanitize_cell(value))?;
        }
    }

    set_column_widths(worksheet, table)?;
    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}

/// Pretty JSON with a four-space indent.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, OutputError> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::po::{HeaderFields, PoRecord};

    fn table() -> Table {
        Table {
            headers: vec!["Description", "Quantity"],
            rows: vec![
                vec!["Bolt, M8".to_string(), "50".to_string()],
                vec!["Nut".to_string(), "4".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = String::from_utf8(table_to_csv(&table()).unwrap()).unwrap();
        assert_eq!(csv, "Description,Quantity\n\"Bolt, M8\",50\nNut,4\n");
    }

    #[test]
    fn test_xlsx_is_a_zip_and_reproducible() {
        let first = table_to_xlsx(&table(), "Line Items").unwrap();
        let second = table_to_xlsx(&table(), "Line Items").unwrap();
        assert_eq!(&first[..2], b"PK");
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_four_space_indent() {
        let records = vec![PoRecord {
            fields: HeaderFields::default(),
            line_items: Vec::new(),
        }];
        let json = String::from_utf8(to_json(&records).unwrap()).unwrap();
        let head = "[\n    {\n        \"PO_Fields\": {\n            \"PO_Number\": \"Not Found\"";
        assert!(json.starts_with(head));
        assert!(json.contains("\n        \"Line_Items\": []\n"));
    }

    #[test]
    fn test_sanitize_drops_control_chars() {
        assert_eq!(sanitize_cell("a\u{1}b\tc"), "ab\tc");
    }
}
