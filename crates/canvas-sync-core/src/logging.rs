//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! Filtering follows `RUST_LOG` when set. Otherwise only warnings and the
//! engine's info events are kept, or debug output for both crates with `--debug`.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "canvas-sync.log";

/// `~/.local/state/canvas-sync/canvas-sync.log` (created parent dir included).
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("canvas-sync")?;
    xdg_dirs
        .place_state_file(LOG_FILE)
        .context("cannot create log directory")
}

/// Initialize structured logging to [`log_file_path`].
///
/// On failure (e.g. state dir unwritable) nothing is installed and the caller
/// can fall back to [`init_logging_stderr`].
pub fn init_logging(debug: bool) -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {e}"))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "canvas-sync logging to {}", path.display());
    Ok(path)
}

/// Log to stderr only. Used when [`init_logging`] fails so the CLI still runs.
pub fn init_logging_stderr(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_directives(debug: bool) -> &'static str {
    if debug {
        "info,canvas_sync_core=debug,canvas_sync=debug"
    } else {
        "warn,canvas_sync_core=info"
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(debug)))
}
