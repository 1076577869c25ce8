// Tracing setup for the shells
//
// RUST_LOG wins when set; otherwise this crate logs at the configured level.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "expense_analyzer={},expense_server={}",
            level, level
        ))
    })
}

/// Log to stderr (CLI and server mode). Safe to call more than once.
pub fn init_tracing(level: &str) {
    TRACING_INIT.call_once(|| {
        let _ = fmt()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Log to a file (TUI mode, where stderr would draw over the screen).
pub fn init_file_tracing(path: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    TRACING_INIT.call_once(|| {
        let _ = fmt()
            .with_env_filter(env_filter(level))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    });

    Ok(())
}
