//! Dynamic Tools MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server whose tools are
//! Rhai scripts in a directory. The directory is rescanned on every
//! `tools/list`, and the built-in `write_tool` lets a client author new tools
//! that are callable in the very next request.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, JSON-RPC dispatch and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Discovery, validation, loading and invocation of tool scripts
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_dynamic_tools::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
