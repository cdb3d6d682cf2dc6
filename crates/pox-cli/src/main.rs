//! CLI application for multi purchase-order PDF extraction.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, config, process, text};

/// Purchase-order extraction - pull header fields and line items out of PO PDFs
#[derive(Parser)]
#[command(name = "pox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract all POs from a single PDF
    Process(process::ProcessArgs),

    /// Extract POs from every PDF matching a glob pattern
    Batch(batch::BatchArgs),

    /// Print the text a PDF yields, or its PO blocks
    Text(text::TextArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    commands::block_on(execute(cli.command, cli.config))
}

async fn execute(command: Commands, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = config_path.as_deref();
    match command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Text(args) => text::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
