use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub autosave_debounce: Duration,
    /// Polishing is disabled when unset.
    pub anthropic_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            autosave_debounce: Duration::from_millis(
                std::env::var("AUTOSAVE_DEBOUNCE_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse::<u64>()
                    .context("AUTOSAVE_DEBOUNCE_MS must be a number of milliseconds")?,
            ),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
        })
    }

    /// Where exports land when the caller names no directory.
    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
