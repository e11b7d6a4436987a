//! Line-delimited JSON-RPC loop shared by the STDIO and TCP transports.
//!
//! Each input line is one message. Blank lines are skipped. Each response is
//! written as one line and flushed right away; notifications produce nothing.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::TransportResult;
use crate::core::McpServer;
use crate::core::protocol::{JsonRpcResponse, PARSE_ERROR};

/// Serve messages from `reader` until end of input.
///
/// A line that is not valid UTF-8 is answered with a parse error, like any
/// other undecodable line.
pub async fn serve_lines<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!("<- {}", line);
                server.process(line.to_string()).await
            }
            Err(e) => {
                warn!("Rejected line that is not valid UTF-8: {}", e);
                Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        };

        if let Some(response) = response {
            let mut out = response.to_line();
            debug!("-> {}", out);
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}
