//! MCP Server implementation and request dispatch.
//!
//! This module contains the main server handler. It decodes JSON-RPC messages,
//! routes them by method and delegates tool work to the [`ToolService`].
//!
//! ## Dispatch
//!
//! | method | response |
//! |---|---|
//! | `initialize` | capability and version descriptor |
//! | `notifications/*` | none |
//! | `ping` | `{}` |
//! | `tools/list` | rebuilds the registry, then lists built-ins and discovered tools |
//! | `tools/call` | `{content: [{type: "text", text}]}`, failures included |
//! | anything else | `-32601` error |
//!
//! Tool failures are never protocol errors: they come back as result text.
//! Requests are handled one at a time; the tool service sits behind a mutex
//! and script execution runs on the blocking pool.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::protocol::{JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use crate::domains::tools::ToolService;

/// The main MCP server handler.
///
/// Cheap to clone; clones share the same tool registry.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool listing and dispatch, one request at a time.
    tools: Arc<Mutex<ToolService>>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// Fails only when the tools directory cannot be created or resolved.
    pub fn new(config: Config) -> Result<Self> {
        let tools = ToolService::new(config.tools.clone())?;

        Ok(Self {
            config: Arc::new(config),
            tools: Arc::new(Mutex::new(tools)),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Handle one raw message off the wire on the blocking pool.
    ///
    /// Script execution is synchronous, so it must not run on an async worker.
    pub async fn process(&self, raw: String) -> Option<JsonRpcResponse> {
        let server = self.clone();
        match tokio::task::spawn_blocking(move || server.handle_message(&raw)).await {
            Ok(response) => response,
            Err(e) => {
                error!("Request handler failed: {}", e);
                Some(JsonRpcResponse::internal_error(
                    Value::Null,
                    "Internal error while handling request",
                ))
            }
        }
    }

    /// Decode and handle one raw message.
    ///
    /// Returns `None` when nothing must be written back.
    pub fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        match JsonRpcRequest::decode(raw) {
            Ok(request) => self.handle_request(request),
            Err(response) => {
                warn!("Rejected message: {:?}", response.error);
                Some(response)
            }
        }
    }

    /// Handle one decoded request.
    #[instrument(skip_all, fields(method = %request.method))]
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            info!("Received notification: {}", request.method);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request),
            _ => {
                warn!("Unknown method: {}", request.method);
                JsonRpcResponse::method_not_found(request.id, &request.method)
            }
        };

        Some(response)
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        info!("Processing initialize request");

        let tools_dir = self.tools().registry().tools_dir().display().to_string();
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": true }
            },
            "serverInfo": {
                "name": self.name(),
                "version": self.version()
            },
            "instructions": format!(
                "Tools are Rhai scripts in {tools_dir}. Use write_tool to add one; it is callable right away."
            )
        });

        JsonRpcResponse::success(id, result)
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        info!("Processing tools/list request");

        let tools = self.tools().list_tools();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let Some(params) = request.params.as_ref().and_then(Value::as_object) else {
            return JsonRpcResponse::invalid_params(request.id, "Missing params");
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
        };

        info!("Processing tools/call request: {}", name);
        let arguments = params.get("arguments").cloned();
        let result = self.tools().call_tool(name, arguments);

        match serde_json::to_value(result) {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        }
    }

    fn tools(&self) -> MutexGuard<'_, ToolService> {
        // A panicking script call leaves the registry itself intact.
        self.tools.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
