//! Text command - show what text a PDF yields and how it segments.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;

use pox_core::TextSource;
use pox_core::po::BlockSegmenter;

use super::{ensure_pdf, load_config};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Print the PO blocks instead of the raw text
    #[arg(long)]
    blocks: bool,

    /// Skip the OCR fallback and use only the PDF text layer
    #[arg(long)]
    no_ocr: bool,
}

pub async fn run(args: TextArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if args.no_ocr {
        config.source.enable_ocr = false;
    }
    ensure_pdf(&args.input)?;
    let segmenter = BlockSegmenter::from_config(&config.segmentation);

    let document = std::fs::read(&args.input)?;
    let sourced = tokio::task::spawn_blocking(move || {
        TextSource::from_config(&config).extract(&document)
    })
    .await?;

    eprintln!(
        "{} {} pages, text from {}",
        style("ℹ").blue(),
        sourced.page_count,
        style(sourced.kind).bold()
    );

    if !args.blocks {
        println!("{}", sourced.text);
        return Ok(());
    }

    for (index, block) in segmenter.segment(&sourced.text).iter().enumerate() {
        println!("{}", style(format!("--- Block {} ---", index + 1)).cyan());
        println!("{}", block.raw_text);
    }
    Ok(())
}
