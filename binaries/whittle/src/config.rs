//! Reducer configuration.
//!
//! Supports loading from a TOML file with CLI arguments layered on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use whittle_engine::IndentTool;

/// Reducer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// External tool configuration.
    pub tools: ToolsConfig,

    /// Debugging aids.
    pub debug: DebugConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, compact, json).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Pretty-printer binary for the `indent` method.
    pub indent_bin: String,

    /// Options passed to the pretty-printer, before the file name.
    pub indent_args: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let tool = IndentTool::default();
        Self {
            indent_bin: tool.bin,
            indent_args: tool.args,
        }
    }
}

impl ToolsConfig {
    /// The engine-side view of the pretty-printer settings.
    pub fn indent_tool(&self) -> IndentTool {
        IndentTool {
            bin: self.indent_bin.clone(),
            args: self.indent_args.clone(),
        }
    }
}

/// Debugging aids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Keep a `delta_tmp_<trial>.c` snapshot of every trial.
    pub keep_trials: bool,
}

impl ReducerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.format = "json".to_string();
        }
        if args.keep_trials {
            self.debug.keep_trials = true;
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        if self.tools.indent_bin.is_empty() {
            anyhow::bail!("Pretty-printer binary name must not be empty");
        }

        Ok(())
    }
}
