//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! Stdout carries protocol messages only; all logging goes to stderr.

use tokio::io::{BufReader, stdin, stdout};
use tracing::info;

use super::TransportResult;
use super::lines::serve_lines;
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        serve_lines(&server, BufReader::new(stdin()), stdout()).await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
