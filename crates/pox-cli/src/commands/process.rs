//! Process command - extract every PO from a single PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use tracing::{debug, info};

use pox_core::output::{Table, fields_table, line_items_table};
use pox_core::{ExtractionReport, ExtractionRequest, TextSourceKind};

use super::{FormatArg, ensure_pdf, load_config, run_pipeline, spinner};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Directory the artifacts are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Table artifact format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Also write the zip bundle of all artifacts
    #[arg(long)]
    bundle: bool,

    /// Skip the OCR fallback and use only the PDF text layer
    #[arg(long)]
    no_ocr: bool,

    /// Fail if processing takes longer than this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not print the extracted tables
    #[arg(short, long)]
    quiet: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(format) = args.format {
        config.output.table_format = format.into();
    }
    if args.no_ocr {
        config.source.enable_ocr = false;
    }

    ensure_pdf(&args.input)?;
    info!("Processing file: {}", args.input.display());

    let pb = spinner(args.quiet);
    pb.set_message("Extracting purchase orders...");

    let request = ExtractionRequest::from_path(&args.input)?;
    let report = run_pipeline(request, config.clone(), args.timeout.map(Duration::from_secs)).await;
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message("Writing artifacts...");
    let artifacts = report.artifacts(&config)?;
    let mut written = artifacts.write_to_dir(&args.output_dir)?;

    if args.bundle {
        let bundle_path = args.output_dir.join(&config.output.bundle_name);
        fs::write(&bundle_path, artifacts.bundle()?)?;
        written.push(bundle_path);
    }
    pb.finish_and_clear();

    if !args.quiet {
        print_report(&report);
    }
    for path in &written {
        println!("{} Wrote {}", style("✓").green(), path.display());
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

fn print_report(report: &ExtractionReport) {
    let source = match report.source {
        TextSourceKind::TextLayer => style(report.source.as_str()).green(),
        TextSourceKind::Ocr => style(report.source.as_str()).yellow(),
        TextSourceKind::Unavailable => style(report.source.as_str()).red(),
    };
    println!(
        "{} {}: {} pages, text from {}, {} POs, {} line items",
        style("ℹ").blue(),
        report.name,
        report.page_count,
        source,
        report.records.len(),
        report.item_count()
    );

    println!();
    println!("{}", style("PO fields").bold());
    print!("{}", render_table(&fields_table(&report.records)));

    println!();
    println!("{}", style("Line items").bold());
    let items = line_items_table(&report.records);
    if items.is_empty() {
        println!("  (none)");
    } else {
        print!("{}", render_table(&items));
    }

    let annotation = report.annotation_summary();
    println!();
    if annotation.applied {
        println!(
            "{} Annotated {} occurrences on the first PO",
            style("ℹ").blue(),
            annotation.marks
        );
        if !annotation.misses.is_empty() {
            println!(
                "{} Not found on any page: {}",
                style("!").yellow(),
                annotation.misses.join(", ")
            );
        }
    } else {
        println!("{} Annotated PDF is an unmodified copy", style("!").yellow());
    }

    for warning in &report.warnings {
        debug!("{}", warning);
    }
}

/// Plain-text table with columns padded to their widest cell.
fn render_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(table.headers.clone());
    for row in &table.rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
