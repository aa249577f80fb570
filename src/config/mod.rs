//! Configuration module
//!
//! Handles loading and managing configuration. Values are layered:
//! command line flags over `MICROUNIT_*` environment variables over the
//! config file over built-in defaults.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::{expand_path, ConfigFile};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::executor::EngineConfig;
use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Result format (text, json, json-pretty, summary)
    pub format: String,

    /// Colour the console report
    pub colorize: bool,

    /// Print the cause chain of each failure
    pub details: bool,

    /// How long to wait for a timed-out test to release the suite instance
    pub reclaim_grace_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Suites run when none are named on the command line; empty means all
    pub default_suites: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colorize: true,
            details: false,
            reclaim_grace_ms: 5000,
            log_level: "warn".to_string(),
            default_suites: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Override fields with values taken from the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if env.no_color == Some(true) {
            self.colorize = false;
        }
        if let Some(details) = env.details {
            self.details = details;
        }
        if let Some(grace) = env.grace_ms {
            self.reclaim_grace_ms = grace;
        }
        if let Some(level) = &env.log {
            self.log_level = level.clone();
        }
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format)
            .with_context(|| format!("Unknown output format: {}", self.format))
    }

    pub fn log_level(&self) -> Result<LogLevel> {
        LogLevel::from_str(&self.log_level)
            .with_context(|| format!("Unknown log level: {}", self.log_level))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reclaim_grace: Duration::from_millis(self.reclaim_grace_ms),
        }
    }

    /// Check values that cannot be expressed by the types alone
    pub fn validate(&self) -> Result<()> {
        self.output_format()?;
        self.log_level()?;
        if self.reclaim_grace_ms == 0 {
            anyhow::bail!("reclaim_grace_ms must be positive");
        }
        Ok(())
    }
}
