use std::path::PathBuf;
use anyhow::{Context, Result};
use flexi_logger::{FileSpec, Logger, LoggerHandle};

/// Where log records go. The TUI owns stderr, so it logs to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

pub fn log_dir() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .context("Could not find local data directory")?
        .join("finsight")
        .join("logs");
    Ok(dir)
}

/// Start logging when a level is given on the command line or in `RUST_LOG`.
///
/// Returns the handle that must stay alive for the rest of the program, or
/// `None` when logging stays off.
pub fn init(level: Option<&str>, target: LogTarget) -> Result<Option<LoggerHandle>> {
    let spec = match level {
        Some(level) => level.to_string(),
        None => match std::env::var("RUST_LOG") {
            Ok(spec) if !spec.trim().is_empty() => spec,
            _ => return Ok(None),
        },
    };

    let logger = Logger::try_with_str(&spec)
        .with_context(|| format!("Invalid log specification: {}", spec))?;

    let logger = match target {
        LogTarget::Stderr => logger.log_to_stderr(),
        LogTarget::File => logger
            .log_to_file(FileSpec::default().directory(log_dir()?).basename("finsight"))
            .format(flexi_logger::detailed_format),
    };

    let handle = logger.start().context("Failed to start logger")?;
    Ok(Some(handle))
}
