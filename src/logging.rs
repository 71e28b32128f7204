//! Process-wide logger setup. Records go to stderr in `detailed_format`.

use anyhow::{Context, Result, bail};
use flexi_logger::{Logger, LoggerHandle};
use log::info;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Lowercases and validates a level name.
pub fn normalize_level(level: &str) -> Result<&'static str> {
    let wanted = level.trim().to_ascii_lowercase();
    match LEVELS.iter().find(|known| **known == wanted) {
        Some(known) => Ok(*known),
        None => bail!(
            "unsupported log level `{}` (expected one of {})",
            level.trim(),
            LEVELS.join(", ")
        ),
    }
}

/// Starts the logger. The returned handle must outlive every log call, so
/// `main` holds it until exit.
pub fn init_logging(level: &str) -> Result<LoggerHandle> {
    let level = normalize_level(level)?;
    let handle = Logger::try_with_str(level)
        .with_context(|| format!("invalid log specification `{level}`"))?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    info!(
        "event=app_start platform={} version={} level={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(handle)
}
