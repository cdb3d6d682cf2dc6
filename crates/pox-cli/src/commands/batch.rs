//! Batch processing command for multiple PO files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use pox_core::models::config::PoxConfig;
use pox_core::{ExtractionRequest, Pipeline, TextSourceKind};

use super::{FormatArg, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory; each file gets a subdirectory named after it
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Table artifact format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Also write a zip bundle per file
    #[arg(long)]
    bundle: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Skip the OCR fallback and use only the PDF text layer
    #[arg(long)]
    no_ocr: bool,
}

const SUMMARY_NAME: &str = "summary.csv";

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    output_name: String,
    outcome: Result<FileStats, String>,
    processing_time_ms: u64,
}

struct FileStats {
    source: TextSourceKind,
    blocks: usize,
    items: usize,
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(format) = args.format {
        config.output.table_format = format.into();
    }
    if args.no_ocr {
        config.source.enable_ocr = false;
    }

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );
    fs::create_dir_all(&args.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    // One pipeline, so OCR models load once; files run sequentially.
    let output_dir = args.output_dir.clone();
    let bundle = args.bundle;
    let continue_on_error = args.continue_on_error;
    let task_pb = pb.clone();
    let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<FileResult>> {
        let pipeline = Pipeline::from_config(&config);
        let mut results = Vec::with_capacity(files.len());
        let names = output_names(&files);

        for (path, output_name) in files.into_iter().zip(names) {
            let file_start = Instant::now();
            let dir = output_dir.join(&output_name);
            let outcome = process_file(&pipeline, &path, &dir, bundle, &config);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            let outcome = match outcome {
                Ok(stats) => Ok(stats),
                Err(e) if continue_on_error => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    Err(e.to_string())
                }
                Err(e) => {
                    error!("Failed to process {}: {}", path.display(), e);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), e);
                }
            };
            results.push(FileResult {
                path,
                output_name,
                outcome,
                processing_time_ms,
            });
            task_pb.inc(1);
        }
        Ok(results)
    })
    .await?;

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };
    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args.output_dir.join(SUMMARY_NAME);
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    println!();
    println!(
        "{} Processed {} files in {:.1}s ({} succeeded, {} failed)",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs_f64(),
        results.len() - failed,
        failed
    );
    for result in results.iter().filter(|r| r.outcome.is_err()) {
        if let Err(e) = &result.outcome {
            println!("  {} {}: {}", style("✗").red(), result.path.display(), e);
        }
    }

    Ok(())
}

/// One output directory name per file: its stem, with `-2`, `-3`, ...
/// appended when an earlier file (or the summary) already took that name.
fn output_names(files: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::from([SUMMARY_NAME.to_string()]);
    files
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let mut name = stem.to_string();
            let mut suffix = 2;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{}-{}", stem, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

fn process_file(
    pipeline: &Pipeline,
    path: &Path,
    dir: &Path,
    bundle: bool,
    config: &PoxConfig,
) -> anyhow::Result<FileStats> {
    let request = ExtractionRequest::from_path(path)?;
    let report = pipeline.run(&request);

    let artifacts = report.artifacts(config)?;
    artifacts.write_to_dir(dir)?;
    if bundle {
        fs::write(dir.join(&config.output.bundle_name), artifacts.bundle()?)?;
    }
    info!("{} -> {}", path.display(), dir.display());

    Ok(FileStats {
        source: report.source,
        blocks: report.blocks.len(),
        items: report.item_count(),
    })
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "file",
        "output",
        "status",
        "source",
        "blocks",
        "items",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let output = result.output_name.as_str();
        let time = result.processing_time_ms.to_string();

        match &result.outcome {
            Ok(stats) => wtr.write_record([
                filename,
                output,
                "success",
                stats.source.as_str(),
                &stats.blocks.to_string(),
                &stats.items.to_string(),
                &time,
                "",
            ])?,
            Err(e) => wtr.write_record([filename, output, "error", "", "", "", &time, e])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
