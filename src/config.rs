//! Canopy Configuration Module
//!
//! Persistent instrumentation defaults stored in
//! `~/.config/canopy/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. `CANOPY_LOG` environment directives (`domain=level,domain=level,...`)
//! 2. Config file (`~/.config/canopy/config.toml`)
//! 3. Built-in defaults

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CanopyError, Result};
use crate::log::sink::{LogSink, Severity};

/// Matches one `domain=level` directive in `CANOPY_LOG`
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_][A-Za-z0-9_.\-]*)=(debug|info|warn|error)$").unwrap()
});

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CanopyConfig {
    /// Log sink thresholds
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event recording settings
    #[serde(default)]
    pub recording: RecordingConfig,
}

/// Threshold configuration for the log sink
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Sink-wide fallback threshold
    pub default_level: Option<Severity>,

    /// Per-domain minimum severities (domain or dot-prefix)
    #[serde(default)]
    pub thresholds: FxHashMap<String, Severity>,
}

/// Recording configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordingConfig {
    /// Directory for recording files (default: `.canopy/recordings`)
    pub dir: Option<PathBuf>,
}

impl CanopyConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/canopy/` on Unix, `%APPDATA%/canopy/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("canopy")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| CanopyError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| CanopyError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to file
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir();
        let path = Self::config_path();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| CanopyError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| CanopyError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| CanopyError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge `CANOPY_LOG` environment directives
    ///
    /// Environment directives take precedence over config file thresholds.
    /// Malformed directives are skipped with a warning, never fatal.
    pub fn with_env(mut self) -> Self {
        if let Ok(directives) = std::env::var("CANOPY_LOG") {
            for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match DIRECTIVE_RE
                    .captures(directive)
                    .and_then(|caps| Some((caps[1].to_string(), caps[2].parse().ok()?)))
                {
                    Some((domain, level)) => {
                        self.logging.thresholds.insert(domain, level);
                    }
                    None => {
                        tracing::warn!(directive, "ignoring malformed CANOPY_LOG directive");
                    }
                }
            }
        }
        self
    }

    /// Install the configured thresholds on a sink
    pub fn apply(&self, sink: &LogSink) {
        if let Some(level) = self.logging.default_level {
            sink.set_default_threshold(level);
        }
        for (domain, level) in &self.logging.thresholds {
            sink.set_threshold(domain, *level);
        }
    }

    /// Effective recording directory
    pub fn recording_dir(&self) -> PathBuf {
        self.recording
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::event::RECORD_DIR))
    }
}
