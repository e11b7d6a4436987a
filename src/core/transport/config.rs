//! Transport configuration types.
//!
//! Only the transports compiled in (see the `stdio`, `tcp` and `http`
//! features) can be selected. `MCP_TRANSPORT` picks one; the matching
//! `MCP_TCP_*` or `MCP_HTTP_*` variables fill in its settings.

use serde::{Deserialize, Serialize};

use crate::core::config::EnvNotice;
#[cfg(any(feature = "tcp", feature = "http"))]
use crate::core::config::parse_env;
#[cfg(feature = "http")]
use crate::core::config::parse_env_flag;

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited JSON-RPC on stdin/stdout.
    #[cfg(feature = "stdio")]
    Stdio,

    /// Line-delimited JSON-RPC on TCP connections.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// One JSON-RPC message per HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpConfig {
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Permissive CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");

impl Default for TransportConfig {
    /// STDIO when compiled in, otherwise the first available network transport.
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        let transport = Self::Stdio;

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        let transport = Self::Tcp(TcpConfig::default());

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        let transport = Self::Http(HttpConfig::default());

        transport
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "tcp")]
impl TcpConfig {
    /// Defaults overridden by `MCP_TCP_HOST` and `MCP_TCP_PORT`.
    fn from_env(notices: &mut Vec<EnvNotice>) -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MCP_TCP_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_env("MCP_TCP_PORT", "a port number", notices) {
            config.port = port;
        }

        config
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Defaults overridden by the `MCP_HTTP_*` variables.
    fn from_env(notices: &mut Vec<EnvNotice>) -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MCP_HTTP_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_env("MCP_HTTP_PORT", "a port number", notices) {
            config.port = port;
        }
        if let Ok(path) = std::env::var("MCP_HTTP_PATH") {
            if path.starts_with('/') {
                config.rpc_path = path;
            } else {
                notices.push(EnvNotice::invalid("MCP_HTTP_PATH", path, "a path starting with '/'"));
            }
        }
        if let Some(cors) = parse_env_flag("MCP_HTTP_CORS", notices) {
            config.enable_cors = cors;
        }

        config
    }
}

impl TransportConfig {
    /// Transport names accepted by `MCP_TRANSPORT` in this build.
    pub fn available() -> Vec<&'static str> {
        let mut names = Vec::new();
        #[cfg(feature = "stdio")]
        names.push("stdio");
        #[cfg(feature = "tcp")]
        names.push("tcp");
        #[cfg(feature = "http")]
        names.push("http");
        names
    }

    /// Select the transport named by `MCP_TRANSPORT`, falling back to the
    /// default (with a notice) when the name is unknown or not compiled in.
    pub fn from_env(notices: &mut Vec<EnvNotice>) -> Self {
        let Ok(name) = std::env::var("MCP_TRANSPORT") else {
            return Self::default();
        };

        match name.trim().to_lowercase().as_str() {
            "" => Self::default(),
            #[cfg(feature = "stdio")]
            "stdio" => Self::Stdio,
            #[cfg(feature = "tcp")]
            "tcp" => Self::Tcp(TcpConfig::from_env(notices)),
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_env(notices)),
            _ => {
                notices.push(EnvNotice::invalid(
                    "MCP_TRANSPORT",
                    name,
                    format!("one of {}", Self::available().join(", ")),
                ));
                Self::default()
            }
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }
}
