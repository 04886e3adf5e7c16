//! Configuration assembly so CLI flags, env vars, and the config file
//! resolve in one place, with the CLI always winning.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::session::clamp_cooldown_ms;

/// Runtime configuration for the dispatcher and replay CLI.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "insight-voice",
    about = "Voice intent dispatcher for the InsightEye accessibility assistant",
    version
)]
pub struct AppConfig {
    /// Screen the session starts on.
    #[arg(long, env = "INSIGHT_VOICE_SCREEN", default_value = "Home")]
    pub screen: String,

    /// Directory for the JSONL document store.
    #[arg(long, env = "INSIGHT_VOICE_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// TOML file with extra per-screen rules.
    #[arg(long, env = "INSIGHT_VOICE_RULES_FILE")]
    pub rules_file: Option<PathBuf>,

    /// Post-dispatch cooldown before the transcript clears, in
    /// milliseconds. Clamped to 1000..=5000.
    #[arg(long, env = "INSIGHT_VOICE_COOLDOWN_MS", default_value_t = 1500)]
    pub cooldown_ms: u64,

    /// Dispatch one transcript and exit.
    #[arg(long)]
    pub transcript: Option<String>,

    /// Print the screens in the built-in catalog and exit.
    #[arg(long)]
    pub list_screens: bool,

    /// Skip welcome prompts during replay.
    #[arg(long)]
    pub no_prompts: bool,

    /// Enable the debug log file.
    #[arg(long, env = "INSIGHT_VOICE_LOGS")]
    pub logs: bool,

    /// Disable logging even if the config file enables it.
    #[arg(long)]
    pub no_logs: bool,
}

/// Optional file-backed defaults, merged under the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub cooldown_ms: Option<u64>,
    pub store_dir: Option<PathBuf>,
    pub rules_file: Option<PathBuf>,
    pub logs: Option<bool>,
}

/// Default config file location under the user config dir.
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("insight-voice").join("config.toml"))
}

/// Whether the user pinned the cooldown via the CLI flag or the env var.
///
/// A pinned cooldown must not be overridden by the config file; clap
/// cannot tell a default apart from an explicit value, so the argv and
/// environment are inspected directly.
#[must_use]
pub fn cooldown_pinned<I>(args: I, env_value: Option<&std::ffi::OsStr>) -> bool
where
    I: IntoIterator<Item = String>,
{
    env_value.is_some()
        || args
            .into_iter()
            .any(|arg| arg == "--cooldown-ms" || arg.starts_with("--cooldown-ms="))
}

impl ConfigFile {
    /// Load the config file if present; a missing file is not an error.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

impl AppConfig {
    /// Fold file-backed defaults into flags the user left untouched, then
    /// clamp the cooldown into its supported window.
    pub fn merge_file(&mut self, file: &ConfigFile, cli_set_cooldown: bool) {
        if !cli_set_cooldown {
            if let Some(ms) = file.cooldown_ms {
                self.cooldown_ms = ms;
            }
        }
        if self.store_dir.is_none() {
            self.store_dir = file.store_dir.clone();
        }
        if self.rules_file.is_none() {
            self.rules_file = file.rules_file.clone();
        }
        if !self.logs {
            self.logs = file.logs.unwrap_or(false);
        }
        self.cooldown_ms = clamp_cooldown_ms(self.cooldown_ms);
    }

    /// Logging is on when requested and not explicitly disabled.
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }
}
