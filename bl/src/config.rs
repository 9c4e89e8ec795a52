//! busylight configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::coordinator::IndicatorConfig;

/// Main busylight configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Coordinator settings
    pub indicator: IndicatorConfig,

    /// Random signal driver settings
    pub demo: DemoConfig,

    /// Indicated-operation simulation settings
    pub simulate: SimulateConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        debug!(?config_path, "Config::load: called");
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        match config_path {
            Some(path) => Self::read_log_level(path),
            None => Self::default_paths()
                .into_iter()
                .find(|p| p.exists())
                .and_then(|p| Self::read_log_level(&p)),
        }
    }

    fn read_log_level(path: &Path) -> Option<String> {
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Project-local config first, then the user config dir
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".busylight.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("busylight").join("busylight.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "Config::load_from_file: called");
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Random signal driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Delay between signals in milliseconds
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,

    /// Chance that a tick sends start rather than stop
    #[serde(rename = "start-probability")]
    pub start_probability: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        debug!("DemoConfig::default: called");
        Self {
            interval_ms: 1500,
            start_probability: 0.5,
        }
    }
}

/// Indicated-operation simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    /// Number of operations to run
    pub operations: usize,

    /// Upper bound on a single operation's duration in milliseconds
    #[serde(rename = "max-duration-ms")]
    pub max_duration_ms: u64,

    /// Fraction of operations that end in an error
    #[serde(rename = "failure-rate")]
    pub failure_rate: f64,

    /// Fraction of operations cancelled before they finish
    #[serde(rename = "cancel-rate")]
    pub cancel_rate: f64,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        debug!("SimulateConfig::default: called");
        Self {
            operations: 20,
            max_duration_ms: 800,
            failure_rate: 0.2,
            cancel_rate: 0.1,
        }
    }
}
