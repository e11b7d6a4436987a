//! Scripting engine setup shared by one discovery pass.
//!
//! A fresh [`Engine`] is built for every rebuild of the registry, so nothing
//! (module cache, limits, hooks) survives from one pass to the next.

use std::path::Path;

use rhai::module_resolvers::FileModuleResolver;
use rhai::{Engine, EvalAltResult};
use tracing::{debug, info};

use crate::core::config::ToolsConfig;

/// File extension recognised as a tool script.
pub const TOOL_EXTENSION: &str = "rhai";

/// Name of the function every tool script must define.
pub const ENTRY_POINT: &str = "invoke";

/// Files starting with this prefix are helpers, never tools.
pub const PRIVATE_PREFIX: char = '_';

/// Build the engine used to compile, load and invoke tools found in `tools_dir`.
///
/// `import "name"` inside a script resolves to `<tools_dir>/name.rhai`, which
/// is how private helper files are shared between tools.
pub fn build_engine(tools_dir: &Path, settings: &ToolsConfig) -> Engine {
    let mut engine = Engine::new();

    let mut resolver = FileModuleResolver::new_with_path_and_extension(tools_dir, TOOL_EXTENSION);
    resolver.enable_cache(false);
    engine.set_module_resolver(resolver);

    // Reading an absent key from `arguments` must fail loudly so the caller
    // gets a "missing required parameter" report instead of a silent `()`.
    engine.set_fail_on_invalid_map_property(true);

    if settings.max_operations > 0 {
        engine.set_max_operations(settings.max_operations);
    }

    // stdout belongs to the protocol
    engine.on_print(|text| info!(target: "tool", "{}", text));
    engine.on_debug(|text, source, pos| {
        debug!(target: "tool", "[{}] {} @ {}", source.unwrap_or("script"), text, pos)
    });

    engine
}

/// Whether `file_name` names a private helper rather than a tool.
pub fn is_private(file_name: &str) -> bool {
    file_name.starts_with(PRIVATE_PREFIX)
}

/// A script error split into its root cause and the frames it bubbled through.
#[derive(Debug)]
pub struct Unwound<'a> {
    /// The innermost error.
    pub root: &'a EvalAltResult,
    /// Frames from outermost to innermost, one line each.
    pub frames: Vec<String>,
    /// Whether the error surfaced while loading an imported module.
    pub through_import: bool,
}

impl Unwound<'_> {
    /// Call stack followed by the root error, one entry per line.
    pub fn trace(&self) -> String {
        let mut out = String::from("Call stack (outermost first):\n");
        for frame in &self.frames {
            out.push_str("  ");
            out.push_str(frame);
            out.push('\n');
        }
        out.push_str(&self.root.to_string());
        out
    }
}

/// Peel function-call and module wrappers off a script error.
pub fn unwind(err: &EvalAltResult) -> Unwound<'_> {
    let mut frames = Vec::new();
    let mut through_import = false;
    let mut current = err;

    loop {
        match current {
            EvalAltResult::ErrorInFunctionCall(name, source, inner, pos) => {
                if source.is_empty() {
                    frames.push(format!("in function '{}' at {}", name, pos));
                } else {
                    frames.push(format!("in function '{}' ({}) at {}", name, source, pos));
                }
                current = inner.as_ref();
            }
            EvalAltResult::ErrorInModule(path, inner, pos) => {
                through_import = true;
                frames.push(format!("in module '{}' at {}", path, pos));
                current = inner.as_ref();
            }
            _ => break,
        }
    }

    Unwound {
        root: current,
        frames,
        through_import,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_prefix() {
        assert!(is_private("_helpers.rhai"));
        assert!(!is_private("greet.rhai"));
        assert!(!is_private("greet_.rhai"));
    }

    #[test]
    fn test_engine_fails_on_missing_map_property() {
        let engine = build_engine(Path::new("."), &ToolsConfig::default());
        let result = engine.eval::<rhai::Dynamic>("let m = #{}; m.missing");
        assert!(result.is_err());
    }

    #[test]
    fn test_unwind_reaches_root_cause() {
        let engine = Engine::new();
        let err = engine
            .run("fn inner() { throw \"boom\"; }\nfn outer() { inner() }\nouter();")
            .unwrap_err();

        let unwound = unwind(&err);
        assert!(matches!(unwound.root, EvalAltResult::ErrorRuntime(..)));
        assert!(unwound.frames.first().unwrap().contains("'outer'"));
        assert!(unwound.frames.last().unwrap().contains("'inner'"));
        assert!(!unwound.through_import);
        assert!(unwound.trace().contains("boom"));
    }

    #[test]
    fn test_operation_budget_is_enforced() {
        let settings = ToolsConfig {
            max_operations: 1_000,
            ..ToolsConfig::default()
        };
        let engine = build_engine(Path::new("."), &settings);
        let result = engine.run("loop { }");
        assert!(result.is_err());
    }
}
