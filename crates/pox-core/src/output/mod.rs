//! Output artifacts: the two tables, the structured JSON, the annotated
//! PDF, and the zip bundle that packages them.

mod tables;
mod writers;

pub use tables::{LINE_ITEM_HEADERS, Table, fields_table, line_items_table};
pub use writers::{table_to_csv, table_to_xlsx, to_json};

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::OutputError;
use crate::models::config::TableFormat;
use crate::models::po::PoRecord;

pub const FIELDS_TABLE_STEM: &str = "All_PO_Main_Fields";
pub const LINE_ITEMS_TABLE_STEM: &str = "All_PO_Line_Items";
pub const STRUCTURED_NAME: &str = "All_PO_Structured_Data.json";
pub const ANNOTATED_NAME: &str = "Annotated_PO.pdf";

/// A named byte blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The four artifacts of one request, in bundle order.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub fields_table: Artifact,
    pub line_items_table: Artifact,
    pub structured: Artifact,
    pub annotated: Artifact,
}

impl Artifacts {
    /// Serialize records and take ownership of the annotated document.
    pub fn build(
        records: &[PoRecord],
        annotated_pdf: Vec<u8>,
        format: TableFormat,
    ) -> Result<Self, OutputError> {
        let render = |stem: &str, sheet: &str, table: Table| -> Result<Artifact, OutputError> {
            let bytes = match format {
                TableFormat::Xlsx => table_to_xlsx(&table, sheet)?,
                TableFormat::Csv => table_to_csv(&table)?,
            };
            Ok(Artifact {
                name: format!("{}.{}", stem, format.extension()),
                bytes,
            })
        };

        let artifacts = Self {
            fields_table: render(FIELDS_TABLE_STEM, "PO Fields", fields_table(records))?,
            line_items_table: render(
                LINE_ITEMS_TABLE_STEM,
                "Line Items",
                line_items_table(records),
            )?,
            structured: Artifact {
                name: STRUCTURED_NAME.to_string(),
                bytes: to_json(records)?,
            },
            annotated: Artifact {
                name: ANNOTATED_NAME.to_string(),
                bytes: annotated_pdf,
            },
        };
        debug!("Built {} artifacts", artifacts.iter().count());
        Ok(artifacts)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        [
            &self.fields_table,
            &self.line_items_table,
            &self.structured,
            &self.annotated,
        ]
        .into_iter()
    }

    /// Write each artifact into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        self.iter()
            .map(|artifact| {
                let path = dir.join(&artifact.name);
                std::fs::write(&path, &artifact.bytes)?;
                Ok(path)
            })
            .collect()
    }

    /// Zip all four artifacts. Entry timestamps are fixed at
    /// 1980-01-01 so identical artifacts give an identical archive.
    pub fn bundle(&self) -> Result<Vec<u8>, OutputError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for artifact in self.iter() {
            zip.start_file(artifact.name.as_str(), options)?;
            zip.write_all(&artifact.bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}
