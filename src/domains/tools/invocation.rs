//! Tool invocation - runs a loaded tool and turns the outcome into text.
//!
//! Failures are classified by their root cause so the client gets a message it
//! can act on. Classification never changes the response shape: every outcome,
//! good or bad, ends up as a single text block.

use rhai::{Dynamic, EvalAltResult};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, instrument};

use super::loader::ToolModule;
use super::runtime::{ENTRY_POINT, unwind};

/// Classified failure of a single tool call. `Display` is the text sent back
/// to the client.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Error: Tool arguments must be an object, got {kind}")]
    ArgumentsNotObject { kind: &'static str },

    #[error("Parameter error in {tool}: {message}{}", entry_hint(.message))]
    ParameterShape { tool: String, message: String },

    #[error("Missing required parameter in {tool}: '{key}'\nAvailable parameters: {available:?}")]
    MissingParameter {
        tool: String,
        key: String,
        available: Vec<String>,
    },

    #[error("Invalid parameter value in {tool}: {message}")]
    InvalidValue { tool: String, message: String },

    #[error(
        "Missing dependency in {tool}: {message}\nAdd the module to the tools directory or update your tool code"
    )]
    MissingDependency { tool: String, message: String },

    #[error("Runtime error in {tool}: {message}\n\nFull traceback:\n{trace}")]
    Runtime {
        tool: String,
        message: String,
        trace: String,
    },
}

fn entry_hint(message: &str) -> String {
    if message.contains(ENTRY_POINT) {
        format!("\nCheck that your {ENTRY_POINT}() function takes exactly one 'arguments' parameter")
    } else {
        String::new()
    }
}

/// Name of a JSON value's type, as reported in argument errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Call `module` with `arguments` and render the result as text.
#[instrument(skip(module, arguments))]
pub fn invoke(
    tool: &str,
    module: &ToolModule,
    arguments: &Map<String, Value>,
) -> Result<String, InvocationError> {
    let input = rhai::serde::to_dynamic(arguments).map_err(|e| InvocationError::InvalidValue {
        tool: tool.to_string(),
        message: e.to_string(),
    })?;

    match module.call(input) {
        Ok(value) => Ok(render_result(value)),
        Err(err) => {
            let available = arguments.keys().cloned().collect();
            let failure = classify(tool, &err, available);
            error!("{}", failure);
            Err(failure)
        }
    }
}

/// Structured results become pretty-printed JSON, everything else is
/// stringified as-is.
pub fn render_result(value: Dynamic) -> String {
    if value.is_map() || value.is_array() {
        let pretty = rhai::serde::from_dynamic::<Value>(&value)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok());
        if let Some(text) = pretty {
            return text;
        }
    }
    value.to_string()
}

fn classify(tool: &str, err: &EvalAltResult, available: Vec<String>) -> InvocationError {
    let unwound = unwind(err);
    let tool = tool.to_string();
    let message = unwound.root.to_string();

    if unwound.through_import {
        return InvocationError::MissingDependency { tool, message };
    }

    match unwound.root {
        EvalAltResult::ErrorPropertyNotFound(key, ..) => InvocationError::MissingParameter {
            tool,
            key: key.clone(),
            available,
        },
        EvalAltResult::ErrorFunctionNotFound(..)
        | EvalAltResult::ErrorMismatchDataType(..)
        | EvalAltResult::ErrorMismatchOutputType(..) => {
            InvocationError::ParameterShape { tool, message }
        }
        EvalAltResult::ErrorArithmetic(..)
        | EvalAltResult::ErrorArrayBounds(..)
        | EvalAltResult::ErrorStringBounds(..) => InvocationError::InvalidValue { tool, message },
        EvalAltResult::ErrorModuleNotFound(..) => {
            InvocationError::MissingDependency { tool, message }
        }
        _ => InvocationError::Runtime {
            tool,
            message,
            trace: unwound.trace(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ToolsConfig;
    use crate::domains::tools::contract::extract_contract;
    use crate::domains::tools::loader::load_tool;
    use crate::domains::tools::runtime::build_engine;
    use serde_json::json;
    use tempfile::TempDir;

    fn module(source: &str) -> (TempDir, ToolModule) {
        let dir = TempDir::new().unwrap();
        let engine = build_engine(dir.path(), &ToolsConfig::default());
        let extracted = extract_contract(&engine, source, "t").unwrap();
        let module = load_tool(engine, &extracted).unwrap();
        (dir, module)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_scalar_result_is_stringified() {
        let (_dir, m) = module("fn invoke(arguments) { parse_int(arguments.a) + parse_int(arguments.b) }");
        let text = invoke("adder", &m, &args(json!({ "a": "2", "b": "3" }))).unwrap();
        assert_eq!(text, "5");
    }

    #[test]
    fn test_string_result_is_verbatim() {
        let (_dir, m) = module("fn invoke(arguments) { \"Hello, \" + arguments.name }");
        let text = invoke("greet", &m, &args(json!({ "name": "Ada" }))).unwrap();
        assert_eq!(text, "Hello, Ada");
    }

    #[test]
    fn test_structured_result_is_pretty_json() {
        let (_dir, m) = module("fn invoke(arguments) { #{ total: 3, items: [1, 2] } }");
        let text = invoke("t", &m, &Map::new()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({ "total": 3, "items": [1, 2] }));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_missing_parameter_lists_supplied_names() {
        let (_dir, m) = module("fn invoke(arguments) { \"Hello, \" + arguments.name }");

        let text = invoke("greet", &m, &Map::new()).unwrap_err().to_string();
        assert!(text.starts_with("Missing required parameter in greet: 'name'"));
        assert!(text.contains("Available parameters: []"));

        let text = invoke("greet", &m, &args(json!({ "nom": "x" })))
            .unwrap_err()
            .to_string();
        assert!(text.contains("Available parameters: [\"nom\"]"));
    }

    #[test]
    fn test_invalid_value() {
        let (_dir, m) = module("fn invoke(arguments) { parse_int(arguments.n) }");
        let err = invoke("t", &m, &args(json!({ "n": "abc" }))).unwrap_err();
        assert!(matches!(err, InvocationError::InvalidValue { .. }), "got {err:?}");
        assert!(err.to_string().starts_with("Invalid parameter value in t:"));
    }

    #[test]
    fn test_parameter_shape_mismatch() {
        let (_dir, m) = module("fn invoke(arguments) { parse_int(arguments.n) }");
        let err = invoke("t", &m, &args(json!({ "n": 5 }))).unwrap_err();
        assert!(matches!(err, InvocationError::ParameterShape { .. }), "got {err:?}");
        assert!(err.to_string().starts_with("Parameter error in t:"));
    }

    #[test]
    fn test_missing_runtime_dependency() {
        let (_dir, m) = module("fn invoke(arguments) { import \"absent\" as a; a::go() }");
        let err = invoke("t", &m, &Map::new()).unwrap_err();
        assert!(matches!(err, InvocationError::MissingDependency { .. }), "got {err:?}");
        assert!(err.to_string().starts_with("Missing dependency in t:"));
    }

    #[test]
    fn test_runtime_error_carries_trace() {
        let (_dir, m) = module(
            "fn fail(x) { throw `bad input ${x}`; }\nfn invoke(arguments) { fail(arguments.x) }",
        );
        let text = invoke("t", &m, &args(json!({ "x": "7" })))
            .unwrap_err()
            .to_string();
        assert!(text.starts_with("Runtime error in t:"));
        assert!(text.contains("bad input 7"));
        assert!(text.contains("Full traceback:"));
        assert!(text.contains("'fail'"));
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!("s")), "string");
        assert_eq!(json_type_name(&Value::Null), "null");
    }
}
