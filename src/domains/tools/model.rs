//! Wire shapes of the tool methods (`tools/list` entries and `tools/call` results).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// One block of tool output. Only text is ever produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Result of `tools/call`, the same shape for success and failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
}

impl CallToolResult {
    /// A result carrying a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_result_wire_shape() {
        let value = serde_json::to_value(CallToolResult::text("5")).unwrap();
        assert_eq!(value, json!({ "content": [{ "type": "text", "text": "5" }] }));
    }

    #[test]
    fn test_summary_uses_camel_case_schema_key() {
        let summary = ToolSummary {
            name: "greet".to_string(),
            description: "Greets.".to_string(),
            input_schema: json!({ "type": "object" }),
        };
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("input_schema").is_none());
    }
}
