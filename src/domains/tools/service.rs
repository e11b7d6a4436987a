//! Tool service implementation.
//!
//! The ToolService is what the protocol layer talks to: it refreshes the
//! registry on listing and routes calls to built-in or discovered tools. Every
//! call produces a [`CallToolResult`]; failures never escape as errors.

use serde_json::Value;
use tracing::{info, instrument, warn};

use super::error::ToolError;
use super::invocation::{InvocationError, invoke, json_type_name};
use super::model::{CallToolResult, ToolSummary};
use super::registry::{ResolvedTool, ToolRegistry};
use crate::core::config::ToolsConfig;

/// Service for listing and calling tools.
pub struct ToolService {
    registry: ToolRegistry,
}

impl ToolService {
    /// Create the service and run the initial discovery pass.
    pub fn new(config: ToolsConfig) -> Result<Self, ToolError> {
        info!("Initializing ToolService");

        let mut registry = ToolRegistry::new(config)?;
        registry.rebuild();

        Ok(Self { registry })
    }

    /// Rebuild the registry and list every tool, built-ins first.
    #[instrument(skip(self))]
    pub fn list_tools(&mut self) -> Vec<ToolSummary> {
        let report = self.registry.rebuild();
        let discovered = report.loaded;

        let tools = self.registry.list();
        info!(
            "Returning {} total tools ({} built-in + {} discovered)",
            tools.len(),
            ToolRegistry::builtins().len(),
            discovered
        );
        tools
    }

    /// Call a tool against the current snapshot.
    ///
    /// `arguments` is `None` when the request omitted it, which is treated as
    /// an empty object.
    #[instrument(skip(self, arguments))]
    pub fn call_tool(&mut self, name: &str, arguments: Option<Value>) -> CallToolResult {
        let Some(tool) = self.registry.resolve(name) else {
            warn!("Unknown tool requested: {}", name);
            return CallToolResult::text(ToolError::not_found(name).to_string());
        };

        let arguments = match arguments.unwrap_or_else(|| Value::Object(Default::default())) {
            Value::Object(map) => map,
            other => {
                let error = InvocationError::ArgumentsNotObject {
                    kind: json_type_name(&other),
                };
                return CallToolResult::text(error.to_string());
            }
        };

        let text = match tool {
            ResolvedTool::Builtin(builtin) => builtin.call(&arguments, &mut self.registry),
            ResolvedTool::Discovered(module) => match invoke(name, &module, &arguments) {
                Ok(text) => text,
                Err(error) => error.to_string(),
            },
        };

        CallToolResult::text(text)
    }

    /// The registry backing this service.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}
