//! Write tool definition.
//!
//! A built-in tool that saves script source into the tools directory and
//! rebuilds the registry, so the new tool can be called in the very next
//! request.

use std::fs;

use schemars::JsonSchema;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use super::BuiltinTool;
use crate::domains::tools::registry::ToolRegistry;
use crate::domains::tools::runtime::{TOOL_EXTENSION, is_private};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the write tool.
///
/// The derived schema is what clients see. Values are read by
/// [`from_arguments`](Self::from_arguments), which treats a missing, empty
/// or non-string field alike.
#[derive(Debug, Clone, JsonSchema)]
pub struct WriteToolParams {
    /// Name of the tool (without .rhai extension)
    pub name: String,

    /// Rhai source for the tool, defining an invoke(arguments) function
    pub content: String,
}

impl WriteToolParams {
    /// Read and validate parameters from a raw arguments object.
    ///
    /// A trailing `.rhai` on the name is dropped. The error is the text to
    /// return to the client.
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, String> {
        let name = arguments.get("name").and_then(Value::as_str).unwrap_or_default();
        let content = arguments
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if name.is_empty() {
            return Err("Error: 'name' parameter is required".to_string());
        }
        if content.is_empty() {
            return Err("Error: 'content' parameter is required".to_string());
        }

        let name = name
            .strip_suffix(&format!(".{TOOL_EXTENSION}"))
            .unwrap_or(name);
        let valid = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name.chars().any(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(format!(
                "Error: Tool name '{name}' must be a valid identifier (letters, numbers, underscores only)"
            ));
        }

        Ok(Self {
            name: name.to_string(),
            content: content.to_string(),
        })
    }

    /// File name the tool is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, TOOL_EXTENSION)
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Write tool - creates or overwrites a tool script.
pub struct WriteTool;

impl WriteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "write_tool";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Create a new dynamic MCP tool by writing Rhai code to a file";

    /// Write the script, rebuild the registry and describe the outcome.
    #[instrument(skip_all)]
    pub fn execute(arguments: &Map<String, Value>, registry: &mut ToolRegistry) -> String {
        let params = match WriteToolParams::from_arguments(arguments) {
            Ok(params) => params,
            Err(message) => {
                warn!("Rejected write_tool call: {}", message);
                return message;
            }
        };

        let file_name = params.file_name();
        let path = registry.tools_dir().join(&file_name);

        if let Err(e) = fs::write(&path, &params.content) {
            warn!("Failed to write tool file {}: {}", path.display(), e);
            return format!("Error writing tool file: {e}");
        }
        info!("Created new tool: {}", file_name);

        let report = registry.rebuild();
        let mut message = format!(
            "Successfully created tool '{}' at {}",
            params.name,
            path.display()
        );
        if is_private(&file_name) {
            message.push_str(&format!(
                "\nWarning: tool '{}' starts with '_' and is treated as a private helper, not a tool",
                params.name
            ));
        } else if let Some(error) = report.rejection_for(&file_name) {
            message.push_str(&format!(
                "\nWarning: tool '{}' failed validation and is not callable: {}",
                params.name, error
            ));
        }

        message
    }

    /// JSON schema derived from [`WriteToolParams`].
    pub fn schema() -> Value {
        let mut schema = serde_json::to_value(schemars::schema_for!(WriteToolParams))
            .unwrap_or_else(|_| json!({ "type": "object" }));

        if let Some(object) = schema.as_object_mut() {
            for key in ["$schema", "title", "description"] {
                object.remove(key);
            }
        }
        schema
    }
}

impl BuiltinTool for WriteTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        Self::schema()
    }

    fn call(&self, arguments: &Map<String, Value>, registry: &mut ToolRegistry) -> String {
        Self::execute(arguments, registry)
    }
}
