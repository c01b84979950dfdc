//! Diagnostic logging setup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initializes `tracing` output on stderr.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the default `warn` level.
pub(crate) fn init(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
