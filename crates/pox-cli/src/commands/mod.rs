//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod text;

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use pox_core::models::config::{PoxConfig, TableFormat};
use pox_core::{ExtractionReport, ExtractionRequest, Pipeline};

/// Table format flag.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    /// Excel workbook
    Xlsx,
    /// Comma-separated values
    Csv,
}

impl From<FormatArg> for TableFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => TableFormat::Xlsx,
            FormatArg::Csv => TableFormat::Csv,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pox")
        .join("config.json")
}

/// The explicit `--config` file, else the default file if it exists,
/// else built-in defaults.
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<PoxConfig> {
    if let Some(path) = config_path {
        return PoxConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(PoxConfig::from_file(&default_path)?)
    } else {
        Ok(PoxConfig::default())
    }
}

/// Fail unless `path` is an existing `.pdf` file.
pub fn ensure_pdf(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }
    Ok(())
}

pub fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the synchronous pipeline on a blocking task.
pub async fn run_pipeline(
    request: ExtractionRequest,
    config: PoxConfig,
    timeout: Option<Duration>,
) -> anyhow::Result<ExtractionReport> {
    run_blocking(move || Pipeline::from_config(&config).run(&request), timeout).await
}

/// Run `task` on a blocking thread, failing once `timeout` elapses.
///
/// An overrun task is not cancelled. It keeps its thread until the
/// runtime is shut down with [`block_on`], which does not wait for it.
pub async fn run_blocking<T, F>(task: F, timeout: Option<Duration>) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, handle)
            .await
            .map_err(|_| anyhow::anyhow!("Processing timed out after {}s", limit.as_secs_f64()))??,
        None => handle.await?,
    };
    Ok(output)
}

/// Drive a command to completion on a fresh runtime.
///
/// The runtime is shut down without waiting for blocking tasks, so a
/// timed-out pipeline cannot hold the process open.
pub fn block_on<T>(command: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(command);
    runtime.shutdown_background();
    result
}
