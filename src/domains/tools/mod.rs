//! Tools domain module.
//!
//! This module turns a directory of Rhai scripts into MCP tools. A script is a
//! tool when it defines a top-level `invoke(arguments)` function; the doc
//! comment on that function becomes the tool's description and input schema.
//!
//! ## Architecture
//!
//! - `contract.rs` - Static checks and schema extraction from source
//! - `loader.rs` - Runs the script body and binds the entry point
//! - `registry.rs` - Snapshot of valid tools, rebuilt from disk on demand
//! - `invocation.rs` - Calls a tool and classifies failures
//! - `builtins/` - Tools shipped with the server (`write_tool`)
//! - `service.rs` - Entry point used by the protocol layer
//! - `runtime.rs` - Engine setup and script error helpers
//! - `error.rs` - Tool-specific error types
//!
//! ## Writing a Tool
//!
//! Drop `my_tool.rhai` into the tools directory (or call `write_tool`):
//!
//! ```rhai
//! /// Repeats a word.
//! /// Parameters:
//! /// - word: the word to repeat
//! /// - times: how many times, default 2
//! fn invoke(arguments) {
//!     let times = if "times" in arguments { parse_int(arguments.times) } else { 2 };
//!     let out = [];
//!     for i in 0..times { out.push(arguments.word); }
//!     out
//! }
//! ```
//!
//! It shows up on the next `tools/list`. Files starting with `_` are never
//! tools but can be imported by tools (`import "_helpers" as h;`).

pub mod builtins;
pub mod contract;
mod error;
pub mod invocation;
pub mod loader;
pub mod model;
pub mod registry;
pub mod runtime;
mod service;

pub use error::{ContractError, DiscoveryError, LoadError, ToolError};
pub use model::{CallToolResult, Content, ToolSummary};
pub use registry::{DiscoveryReport, ToolDescriptor, ToolRegistry};
pub use service::ToolService;
