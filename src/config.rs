//! Configuration Module - User preferences from config.toml
//!
//! Supports:
//! - Log level and log format for the command line tool
//! - Input size ceiling and directory traversal for `examine`
//! - Report format and colouring

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Keysniff Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Detection settings
    pub detect: DetectConfig,
    /// Report settings
    pub output: OutputConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
    /// Log format: compact or json
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

/// Detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Files larger than this are reported instead of read (0 = no limit)
    pub max_input_bytes: u64,
    /// Descend into directories
    pub recursive: bool,
    /// Skip dot files when walking directories
    pub skip_hidden: bool,
    /// Number of parallel workers (0 = auto)
    pub workers: usize,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            recursive: false,
            skip_hidden: true,
            workers: 0, // auto-detect
        }
    }
}

impl DetectConfig {
    pub fn input_limit(&self) -> Option<u64> {
        (self.max_input_bytes > 0).then_some(self.max_input_bytes)
    }
}

/// Report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format: human or json
    pub format: ReportFormat,
    /// Colour human output
    pub color: bool,
    /// Print what each match was based on
    pub show_evidence: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Human,
            color: true,
            show_evidence: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Aligned, coloured text
    Human,
    /// One JSON document
    Json,
}

impl Config {
    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "keysniff", "keysniff")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".keysniff").join("config.toml"))
    }

    /// Write the commented sample config to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn ensure_exists_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, generate_sample_config())
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        tracing::info!(path = %path.display(), "created default config");
        Ok(true)
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# Keysniff Configuration
# Location: ~/.config/keysniff/config.toml (or %APPDATA%\keysniff\config\config.toml on Windows)

[general]
# Log level: trace, debug, info, warn, error
log_level = "warn"

# Log format: "compact" or "json"
log_format = "compact"

[detect]
# Files larger than this many bytes are skipped (0 = no limit)
max_input_bytes = 67108864

# Descend into directories given to `examine`
recursive = false

# Skip dot files while walking directories
skip_hidden = true

# Parallel workers (0 = one per CPU)
workers = 0

[output]
# Report format: "human" or "json"
format = "human"

# Colour the human report
color = true

# Show what each detection was based on
show_evidence = false
"#
    .to_string()
}
