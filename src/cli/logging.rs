//! Logging initialization

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Initialize logging.
///
/// `RUST_LOG` wins when set; otherwise `debug` with the debug flag and
/// `warn` without. Logs go to stderr so stdout stays clean for command
/// output, or to `log_file` when one is given.
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_file(debug)
        .with_line_number(debug)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
