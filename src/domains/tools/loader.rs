//! Module loading - turns a validated script into a callable tool.
//!
//! Loading runs the script's top-level statements exactly once and keeps the
//! resulting module, including anything the body imported. The module is then
//! registered in an engine owned by that tool alone, so `invoke` sees the same
//! imports on every call. Anything that goes wrong stays scoped to that one
//! file and comes back as a [`LoadError`].

use std::fmt;

use rhai::{AST, CallFnOptions, Dynamic, Engine, EvalAltResult, FnAccess, Module, Scope};

use super::contract::ExtractedTool;
use super::error::LoadError;
use super::runtime::{ENTRY_POINT, unwind};

/// A loaded tool script with its entry point bound.
pub struct ToolModule {
    engine: Engine,
    source: Option<String>,
    imports: usize,
}

impl ToolModule {
    /// Call the entry point with `arguments` as its only parameter.
    ///
    /// The script body is not re-run.
    pub fn call(&self, arguments: Dynamic) -> Result<Dynamic, Box<EvalAltResult>> {
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .in_all_namespaces(true);

        self.engine
            .call_fn_with_options(options, &mut Scope::new(), &AST::empty(), ENTRY_POINT, (arguments,))
            .or_else(|err| match *err {
                EvalAltResult::Exit(value, ..) => Ok(value),
                _ => Err(err),
            })
    }

    /// Source name the script was loaded under (its file stem).
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Modules imported by the script body and kept for its functions.
    pub fn imports(&self) -> usize {
        self.imports
    }
}

impl fmt::Debug for ToolModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolModule")
            .field("source", &self.source)
            .field("imports", &self.imports)
            .finish()
    }
}

/// Execute the script body in `engine` and bind its entry point.
///
/// `engine` becomes the tool's own engine.
pub fn load_tool(mut engine: Engine, extracted: &ExtractedTool) -> Result<ToolModule, LoadError> {
    let ast = &extracted.ast;

    let module = Module::eval_ast_as_new(Scope::new(), ast, &engine)
        .map_err(|err| classify_load_failure(&err))?;

    let entry = ast
        .iter_functions()
        .find(|f| f.name == ENTRY_POINT && f.params.len() == 1)
        .map(|f| f.access);

    match entry {
        None => Err(LoadError::EntryNotCallable {
            entry: ENTRY_POINT,
            reason: "no single-parameter definition after load".to_string(),
        }),
        Some(FnAccess::Private) => Err(LoadError::EntryNotCallable {
            entry: ENTRY_POINT,
            reason: "it is declared private".to_string(),
        }),
        Some(_) => {
            let imports = module.iter_sub_modules().count();
            engine.register_global_module(module.into());

            Ok(ToolModule {
                engine,
                source: ast.source().map(str::to_string),
                imports,
            })
        }
    }
}

fn classify_load_failure(err: &EvalAltResult) -> LoadError {
    let unwound = unwind(err);

    if unwound.through_import || matches!(unwound.root, EvalAltResult::ErrorModuleNotFound(..)) {
        LoadError::Dependency(err.to_string())
    } else {
        LoadError::Execution(err.to_string())
    }
}
