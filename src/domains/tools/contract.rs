//! Contract extraction - reads a tool's calling contract from its source.
//!
//! A tool script declares its contract on the doc comment of its entry point:
//!
//! ```rhai
//! /// Greets someone.
//! /// Parameters:
//! /// - name: who to greet
//! /// - greeting: word to use (optional)
//! fn invoke(arguments) {
//!     let greeting = if "greeting" in arguments { arguments.greeting } else { "Hello" };
//!     `${greeting}, ${arguments.name}!`
//! }
//! ```
//!
//! The first doc line becomes the description. Bullets under a `Parameters`
//! header become string-typed properties of the input schema. A parameter is
//! required unless its description mentions "default" or "optional"; that is a
//! plain word match, not a type system, and it will misfire on descriptions
//! that use those words for other reasons.
//!
//! Everything here is static: nothing in the script runs until the
//! [loader](super::loader) takes over.

use rhai::{AST, Engine};
use serde_json::{Map, Value, json};

use super::error::ContractError;
use super::runtime::ENTRY_POINT;

/// Header that opens the parameter list (compared case-insensitively).
const PARAMETERS_HEADER: &str = "parameters";

/// Words that mark a parameter as not required.
const OPTIONAL_MARKERS: [&str; 2] = ["default", "optional"];

/// One documented parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    /// Create a parameter, deciding `required` from its description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        let lower = description.to_lowercase();
        let required = !OPTIONAL_MARKERS.iter().any(|marker| lower.contains(marker));

        Self {
            name: name.into(),
            description,
            required,
        }
    }
}

/// Description and parameters derived from a tool's documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContract {
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolContract {
    /// Contract for a tool whose entry point carries no documentation.
    pub fn undocumented(stem: &str) -> Self {
        Self {
            description: format!("Dynamic tool: {stem}"),
            parameters: Vec::new(),
        }
    }

    /// Add a parameter. A repeated name takes the later description in place,
    /// but stays required once any entry for it was required.
    fn push(&mut self, parameter: ParameterSpec) {
        match self.parameters.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => {
                existing.required |= parameter.required;
                existing.description = parameter.description;
            }
            None => self.parameters.push(parameter),
        }
    }

    /// Names of the required parameters, in documentation order.
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON schema advertised to clients in `tools/list`.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": "string", "description": p.description }),
                )
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }
}

/// A script that passed static validation, ready for the loader.
#[derive(Debug, Clone)]
pub struct ExtractedTool {
    pub contract: ToolContract,
    pub ast: AST,
}

/// Parse `source`, locate and validate the entry point, and derive its contract.
///
/// `stem` is the file stem, used for the default description of undocumented
/// tools. Rejections are returned, never raised.
pub fn extract_contract(
    engine: &Engine,
    source: &str,
    stem: &str,
) -> Result<ExtractedTool, ContractError> {
    let mut ast = engine.compile(source).map_err(|err| ContractError::Syntax {
        line: err.position().line(),
        message: err.err_type().to_string(),
    })?;
    ast.set_source(stem);

    let contract = {
        let candidates: Vec<_> = ast
            .iter_functions()
            .filter(|f| f.name == ENTRY_POINT)
            .collect();

        let Some(entry) = candidates.iter().find(|f| f.params.len() == 1) else {
            return Err(match candidates.first() {
                Some(f) => ContractError::WrongSignature {
                    entry: ENTRY_POINT,
                    arity: f.params.len(),
                },
                None => ContractError::MissingEntryPoint { entry: ENTRY_POINT },
            });
        };

        parse_doc_block(&doc_text(&entry.comments), stem)
    };

    Ok(ExtractedTool { contract, ast })
}

/// Strip comment markers from the doc comments attached to a function.
///
/// Accepts `///` line comments and `/** */` block comments; leading `*`
/// gutters inside a block are removed.
pub fn doc_text(comments: &[&str]) -> String {
    let mut lines = Vec::new();

    for comment in comments {
        if let Some(body) = comment.trim_start().strip_prefix("/**") {
            let body = body.trim_end();
            let body = body.strip_suffix("*/").unwrap_or(body);
            for line in body.lines() {
                let line = line.trim_start();
                let line = match line.strip_prefix('*') {
                    Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                    None => line,
                };
                lines.push(line);
            }
        } else {
            for line in comment.lines() {
                let line = line.trim_start();
                let line = line.strip_prefix("///").unwrap_or(line);
                lines.push(line.strip_prefix(' ').unwrap_or(line));
            }
        }
    }

    lines.join("\n")
}

/// Parse documentation text into a [`ToolContract`].
///
/// Blank documentation yields [`ToolContract::undocumented`]. The parameter
/// section starts at a line beginning with "parameters" (any case) and ends at
/// the first non-blank line that does not start with `-`. Inside it, each
/// `- name: description` line declares one parameter; bullets without a colon
/// are ignored.
pub fn parse_doc_block(doc: &str, stem: &str) -> ToolContract {
    let doc = doc.trim();
    if doc.is_empty() {
        return ToolContract::undocumented(stem);
    }

    let mut lines = doc.lines();
    let mut contract = ToolContract {
        description: lines.next().unwrap_or_default().trim_end().to_string(),
        parameters: Vec::new(),
    };

    let mut in_params = false;
    for line in lines {
        let line = line.trim();

        if line.to_lowercase().starts_with(PARAMETERS_HEADER) {
            in_params = true;
            continue;
        }
        if !in_params {
            continue;
        }
        if !line.is_empty() && !line.starts_with('-') {
            break;
        }

        let Some(entry) = line.strip_prefix("- ") else {
            continue;
        };
        if let Some((name, description)) = entry.trim().split_once(':') {
            contract.push(ParameterSpec::new(name.trim(), description.trim()));
        }
    }

    contract
}
