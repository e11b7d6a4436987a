//! Built-in tools.
//!
//! Built-ins live in the server binary rather than the tools directory. They
//! are listed ahead of discovered tools and win any name collision at
//! dispatch time. Unlike discovered tools they get mutable access to the
//! registry, which is how `write_tool` forces a rebuild.

mod write_tool;

use serde_json::{Map, Value};

use super::model::ToolSummary;
use super::registry::ToolRegistry;

pub use write_tool::{WriteTool, WriteToolParams};

/// A tool implemented in Rust and shipped with the server.
pub trait BuiltinTool: Send + Sync {
    /// Name clients call the tool by.
    fn name(&self) -> &'static str;

    /// Description shown in `tools/list`.
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn input_schema(&self) -> Value;

    /// Run the tool. Failures are reported in the returned text.
    fn call(&self, arguments: &Map<String, Value>, registry: &mut ToolRegistry) -> String;

    /// Listing entry for this tool.
    fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

static BUILTINS: &[&dyn BuiltinTool] = &[&WriteTool];

/// The fixed set of built-in tools, in listing order.
pub fn builtins() -> &'static [&'static dyn BuiltinTool] {
    BUILTINS
}
