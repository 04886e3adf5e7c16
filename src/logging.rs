//! File-backed tracing setup so diagnostics never talk over the
//! synthesizer's audio or the replay output.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

/// Cap on the log file before it is truncated at startup.
const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Path to the log file we recycle between runs.
#[must_use]
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join("insight_voice.log")
}

/// Install the global tracing subscriber writing to the log file.
///
/// An oversized file from earlier runs is removed first. Calling this a
/// second time is a no-op.
pub fn init_logging() -> Result<()> {
    let path = log_file_path();
    if let Ok(meta) = fs::metadata(&path) {
        if meta.len() > LOG_MAX_BYTES {
            let _ = fs::remove_file(&path);
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    Ok(())
}
