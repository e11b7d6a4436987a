//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (optionally via a `.env` file) on top of defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Tool discovery and execution settings.
    pub tools: ToolsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Configuration for the tools domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory scanned for `*.rhai` tool scripts. Created if missing.
    pub directory: PathBuf,

    /// Operation budget for a single script run (load or call).
    /// Zero disables the limit.
    pub max_operations: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-dynamic-tools".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("tools"),
            max_operations: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Something worth reporting about the environment, collected while the
/// configuration is read and logged once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvNotice {
    /// The variable is unset; a default is used.
    Defaulted { var: &'static str, value: String },

    /// The variable is set but unusable; it is ignored.
    Invalid {
        var: &'static str,
        value: String,
        expected: String,
    },
}

impl EnvNotice {
    pub fn invalid(var: &'static str, value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Emit the notice through `tracing`.
    pub fn log(&self) {
        match self {
            Self::Defaulted { var, value } => info!("{} not set - using {}", var, value),
            Self::Invalid {
                var,
                value,
                expected,
            } => warn!(
                "Ignoring invalid {} value '{}', expected {}",
                var, value, expected
            ),
        }
    }
}

/// Read and parse `var`. Unset gives `None`; an unparsable value gives `None`
/// and a notice.
pub(crate) fn parse_env<T: FromStr>(
    var: &'static str,
    expected: &str,
    notices: &mut Vec<EnvNotice>,
) -> Option<T> {
    let value = std::env::var(var).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            notices.push(EnvNotice::invalid(var, value, expected));
            None
        }
    }
}

/// Read a boolean flag: `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
pub(crate) fn parse_env_flag(var: &'static str, notices: &mut Vec<EnvNotice>) -> Option<bool> {
    let value = std::env::var(var).ok()?;
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            notices.push(EnvNotice::invalid(var, value, "true or false"));
            None
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_TOOLS_DIR`, `MCP_LOG_LEVEL`. Problems with the values
    /// are dropped; use [`from_env_with_notices`](Self::from_env_with_notices)
    /// to report them.
    pub fn from_env() -> Self {
        Self::from_env_with_notices().0
    }

    /// Load configuration from environment variables, returning what should
    /// be reported about them once logging is initialized.
    pub fn from_env_with_notices() -> (Self, Vec<EnvNotice>) {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        let mut notices = Vec::new();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        match std::env::var("MCP_TOOLS_DIR") {
            Ok(dir) => config.tools.directory = PathBuf::from(dir),
            Err(_) => notices.push(EnvNotice::Defaulted {
                var: "MCP_TOOLS_DIR",
                value: config.tools.directory.display().to_string(),
            }),
        }

        if let Some(limit) = parse_env("MCP_TOOL_MAX_OPERATIONS", "a number", &mut notices) {
            config.tools.max_operations = limit;
        }

        config.transport = TransportConfig::from_env(&mut notices);

        (config, notices)
    }
}

/// Serializes tests that touch process environment variables.
#[cfg(test)]
pub(crate) static ENV_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
