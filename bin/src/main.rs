//! idsweep CLI - downloads sequentially numbered media until the ids run out.

use anyhow::{Context, Result};
use clap::Parser;
use idsweep_lib::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

mod display;
mod logging;

use display::{ConsoleReporter, SummaryFormat};

#[derive(Parser, Debug)]
#[command(name = "idsweep")]
#[command(about = "Download sequentially numbered media until the id range runs out", long_about = None)]
#[command(version)]
struct Cli {
    /// URL template with a single {id} placeholder (e.g. https://cdn.example.com/{id}.mp4)
    template: Option<String>,

    /// TOML config file. Flags override values read from it.
    #[arg(short, long, env = "IDSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// First id to try
    #[arg(short, long)]
    start: Option<u64>,

    /// Directory downloads are written to. Created if missing.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum concurrent downloads
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skip files whose declared size exceeds this many bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Stop starting new ids after this many consecutive failures
    #[arg(long)]
    failure_threshold: Option<u32>,

    /// Extension for downloaded files, without the dot
    #[arg(long)]
    extension: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Connect timeout in seconds
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Print the run summary as JSON instead of progress output
    #[arg(long)]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Builds the run configuration: file values first, then flag overrides.
    fn sweep_config(&self) -> Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SweepConfig::default(),
        };

        if let Some(template) = &self.template {
            config.url_template = Some(
                UrlTemplate::parse(template.as_str())
                    .with_context(|| format!("Invalid URL template: {template}"))?,
            );
        }
        if let Some(start) = self.start {
            config.start_id = start;
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory.clone_from(dir);
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_downloads = concurrency;
        }
        if let Some(max_size) = self.max_size {
            config.max_file_size_bytes = max_size;
        }
        if let Some(threshold) = self.failure_threshold {
            config.failure_threshold = threshold;
        }
        if let Some(extension) = &self.extension {
            config.file_extension.clone_from(extension);
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout_secs = timeout;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    const fn summary_format(&self) -> SummaryFormat {
        if self.json {
            SummaryFormat::Json
        } else {
            SummaryFormat::Text
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = cli.sweep_config()?;
    let reporter = Arc::new(ConsoleReporter::new(
        cli.quiet || cli.json,
        cli.summary_format(),
    ));

    let sweeper =
        Sweeper::with_http(config, reporter).context("Failed to prepare the download run")?;

    // First Ctrl-C stops new ids from being claimed; a second one exits
    let handle = sweeper.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received, finishing in-flight downloads");
        handle.request_stop();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt received, exiting");
            std::process::exit(130);
        }
    });

    let summary = sweeper.run().await.context("Download run aborted")?;
    tracing::debug!(next_id = summary.next_id, "Run finished");
    Ok(())
}
