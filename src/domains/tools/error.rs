//! Tool-specific error types.
//!
//! Discovery failures are split by stage: [`ContractError`] for problems found
//! in the source text itself and [`LoadError`] for problems that only show up
//! once the script is executed. Neither ever escapes a discovery pass; they are
//! logged and recorded against the offending file.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the tools domain outside of a single tool's lifecycle.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tools directory could not be created or read.
    #[error("Tools directory '{path}' is unavailable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested tool was not found.
    #[error("Tool '{0}' not found")]
    NotFound(String),
}

impl ToolError {
    /// Create a new "directory unavailable" error.
    pub fn directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }
}

/// Rejections produced while reading a tool's calling contract from source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The script does not parse.
    #[error("Syntax error{}: {message}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Syntax { line: Option<usize>, message: String },

    /// No top-level entry point function is declared.
    #[error("missing '{entry}' function")]
    MissingEntryPoint { entry: &'static str },

    /// The entry point exists but does not take exactly one parameter.
    #[error("{entry}() must take exactly 1 parameter (arguments), got {arity}")]
    WrongSignature { entry: &'static str, arity: usize },
}

/// Rejections produced while instantiating a tool script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// A top-level statement failed while the script body ran.
    #[error("Error executing module body: {0}")]
    Execution(String),

    /// An `import` required by the script body could not be resolved or loaded.
    #[error("Import error: {0}")]
    Dependency(String),

    /// The entry point was declared but cannot be called from outside the script.
    #[error("'{entry}' is declared but not callable: {reason}")]
    EntryNotCallable { entry: &'static str, reason: String },
}

/// Why a candidate file was left out of the registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("Could not read file: {0}")]
    Read(String),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_mentions_line_when_known() {
        let err = ContractError::Syntax {
            line: Some(3),
            message: "Expecting ')'".to_string(),
        };
        assert_eq!(err.to_string(), "Syntax error at line 3: Expecting ')'");

        let err = ContractError::Syntax {
            line: None,
            message: "Unexpected end".to_string(),
        };
        assert_eq!(err.to_string(), "Syntax error: Unexpected end");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ToolError::not_found("nope").to_string(), "Tool 'nope' not found");
    }
}
