//! Tool Registry - the current set of callable tools.
//!
//! This module provides:
//! - Discovery of tool scripts in the tools directory
//! - The snapshot of valid tools, replaced wholesale on every rebuild
//! - Lookup that gives built-in tools priority over discovered ones
//!
//! There is no incremental update: a rebuild scans the directory from scratch,
//! builds a new engine and new callables, and swaps the whole map in.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rhai::Engine;
use tracing::{debug, error, info, instrument, warn};

use crate::core::config::ToolsConfig;

use super::builtins::{BuiltinTool, builtins};
use super::contract::{ToolContract, extract_contract};
use super::error::{DiscoveryError, ToolError};
use super::loader::{ToolModule, load_tool};
use super::model::ToolSummary;
use super::runtime::{TOOL_EXTENSION, build_engine, is_private};

// ============================================================================
// Descriptors
// ============================================================================

/// A discovered tool: its contract plus the bound entry point.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Registry key, the file stem.
    pub name: String,
    /// Description and parameters read from the doc comment.
    pub contract: ToolContract,
    /// File the tool was loaded from.
    pub path: PathBuf,
    module: Arc<ToolModule>,
}

impl ToolDescriptor {
    /// The callable entry point.
    pub fn module(&self) -> Arc<ToolModule> {
        Arc::clone(&self.module)
    }

    /// Listing entry for this tool.
    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.contract.description.clone(),
            input_schema: self.contract.input_schema(),
        }
    }
}

/// A tool name resolved for dispatch.
pub enum ResolvedTool {
    Builtin(&'static dyn BuiltinTool),
    Discovered(Arc<ToolModule>),
}

// ============================================================================
// Discovery report
// ============================================================================

/// A file left out of the snapshot, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub file: String,
    pub error: DiscoveryError,
}

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Tool files found, private helpers included.
    pub scanned: usize,
    /// Tools that made it into the snapshot.
    pub loaded: usize,
    /// Files that did not.
    pub rejected: Vec<Rejection>,
}

impl DiscoveryReport {
    /// The rejection recorded for `file`, if any.
    pub fn rejection_for(&self, file: &str) -> Option<&DiscoveryError> {
        self.rejected
            .iter()
            .find(|r| r.file == file)
            .map(|r| &r.error)
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - owns the snapshot of valid tools.
pub struct ToolRegistry {
    tools_dir: PathBuf,
    settings: ToolsConfig,
    tools: BTreeMap<String, ToolDescriptor>,
    report: DiscoveryReport,
}

impl ToolRegistry {
    /// Create a registry for the configured directory, creating it if absent.
    ///
    /// The snapshot starts empty; call [`rebuild`](Self::rebuild) to populate it.
    pub fn new(settings: ToolsConfig) -> Result<Self, ToolError> {
        let dir = &settings.directory;
        fs::create_dir_all(dir).map_err(|e| ToolError::directory(dir, e))?;
        let tools_dir = dir.canonicalize().map_err(|e| ToolError::directory(dir, e))?;

        info!("Tool registry using directory: {}", tools_dir.display());

        Ok(Self {
            tools_dir,
            settings,
            tools: BTreeMap::new(),
            report: DiscoveryReport::default(),
        })
    }

    /// The canonical tools directory.
    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    /// The built-in tools, always listed first and resolved first.
    pub fn builtins() -> &'static [&'static dyn BuiltinTool] {
        builtins()
    }

    /// Rescan the tools directory and replace the snapshot.
    #[instrument(skip(self), fields(dir = %self.tools_dir.display()))]
    pub fn rebuild(&mut self) -> &DiscoveryReport {
        let (tools, report) = self.discover();
        self.tools = tools;
        self.report = report;
        &self.report
    }

    /// Look up a discovered tool.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Resolve a name for dispatch: built-ins first, then the snapshot.
    pub fn resolve(&self, name: &str) -> Option<ResolvedTool> {
        if let Some(builtin) = builtins().iter().find(|b| b.name() == name) {
            return Some(ResolvedTool::Builtin(*builtin));
        }
        self.get(name).map(|d| ResolvedTool::Discovered(d.module()))
    }

    /// Listing order: built-ins, then discovered tools by name.
    pub fn list(&self) -> Vec<ToolSummary> {
        builtins()
            .iter()
            .map(|b| b.summary())
            .chain(self.tools.values().map(ToolDescriptor::summary))
            .collect()
    }

    /// Report of the most recent rebuild.
    pub fn last_report(&self) -> &DiscoveryReport {
        &self.report
    }

    /// Number of discovered tools in the snapshot.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn discover(&self) -> (BTreeMap<String, ToolDescriptor>, DiscoveryReport) {
        let mut tools = BTreeMap::new();
        let mut report = DiscoveryReport::default();

        let (files, private) = match self.candidate_files() {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Failed to read tools directory {}: {}", self.tools_dir.display(), e);
                return (tools, report);
            }
        };

        // Compiling needs no per-tool state; each loaded tool gets its own engine.
        let compiler = build_engine(&self.tools_dir, &self.settings);
        report.scanned = private;

        for (file, stem, path) in files {
            report.scanned += 1;

            match self.load_file(&compiler, &path, &stem) {
                Ok(descriptor) => {
                    info!("✓ Loaded tool: {}", descriptor.name);
                    tools.insert(descriptor.name.clone(), descriptor);
                }
                Err(error) => {
                    warn!("✗ Invalid tool {}: {}", file, error);
                    report.rejected.push(Rejection { file, error });
                }
            }
        }

        report.loaded = tools.len();
        info!(
            "Tool discovery complete: {}/{} files are valid tools",
            report.loaded, report.scanned
        );

        if report.scanned > 0 && report.loaded == 0 {
            warn!(
                "No valid tools found! Check that your .{} files define an 'invoke(arguments)' function",
                TOOL_EXTENSION
            );
        }

        (tools, report)
    }

    /// Tool files directly inside the directory, sorted by name, as
    /// `(file name, stem, path)`, plus the number of private helpers skipped.
    fn candidate_files(&self) -> std::io::Result<(Vec<(String, String, PathBuf)>, usize)> {
        let entries = fs::read_dir(&self.tools_dir)?.map(|entry| entry.map(|e| e.path()));
        Ok(select_candidates(&self.tools_dir, entries))
    }

    fn load_file(
        &self,
        compiler: &Engine,
        path: &Path,
        stem: &str,
    ) -> Result<ToolDescriptor, DiscoveryError> {
        let source = fs::read_to_string(path).map_err(|e| DiscoveryError::Read(e.to_string()))?;
        let extracted = extract_contract(compiler, &source, stem)?;
        let module = load_tool(build_engine(&self.tools_dir, &self.settings), &extracted)?;

        Ok(ToolDescriptor {
            name: stem.to_string(),
            contract: extracted.contract,
            path: path.to_path_buf(),
            module: Arc::new(module),
        })
    }
}

fn select_candidates(
    dir: &Path,
    entries: impl IntoIterator<Item = std::io::Result<PathBuf>>,
) -> (Vec<(String, String, PathBuf)>, usize) {
    let mut files = Vec::new();
    let mut private = 0;

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TOOL_EXTENSION) {
            continue;
        }

        let (Some(file), Some(stem)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };

        if is_private(file) {
            debug!("Skipping private file: {}", file);
            private += 1;
            continue;
        }

        files.push((file.to_string(), stem.to_string(), path.clone()));
    }

    files.sort();
    (files, private)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::error::{ContractError, LoadError};
    use serde_json::json;
    use tempfile::TempDir;

    const GREET: &str = "/// Greets.\n/// Parameters:\n/// - name: who to greet\nfn invoke(arguments) {\n    \"Hello, \" + arguments.name\n}\n";

    fn registry(dir: &TempDir) -> ToolRegistry {
        ToolRegistry::new(ToolsConfig {
            directory: dir.path().to_path_buf(),
            ..ToolsConfig::default()
        })
        .unwrap()
    }

    fn write(dir: &TempDir, file: &str, content: &str) {
        fs::write(dir.path().join(file), content).unwrap();
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("tools");
        let registry = ToolRegistry::new(ToolsConfig {
            directory: nested.clone(),
            ..ToolsConfig::default()
        })
        .unwrap();
        assert!(nested.is_dir());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rebuild_discovers_valid_tool() {
        let dir = TempDir::new().unwrap();
        write(&dir, "greet.rhai", GREET);

        let mut registry = registry(&dir);
        let report = registry.rebuild();
        assert_eq!((report.scanned, report.loaded), (1, 1));

        let greet = registry.get("greet").unwrap();
        assert_eq!(greet.contract.description, "Greets.");
        assert_eq!(greet.contract.input_schema()["required"], json!(["name"]));
        assert_eq!(greet.path.file_name().unwrap(), "greet.rhai");
    }

    #[test]
    fn test_invalid_files_are_excluded_and_reported() {
        let dir = TempDir::new().unwrap();
        write(&dir, "greet.rhai", GREET);
        write(&dir, "no_entry.rhai", "fn helper(x) { x }");
        write(&dir, "two_args.rhai", "/// Doc.\nfn invoke(a, b) { a }");
        write(&dir, "broken.rhai", "fn invoke(arguments) {");
        write(&dir, "explodes.rhai", "throw \"boom\";\nfn invoke(arguments) { 1 }");

        let mut registry = registry(&dir);
        let report = registry.rebuild().clone();

        assert_eq!(report.scanned, 5);
        assert_eq!(report.loaded, 1);
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            report.rejection_for("no_entry.rhai"),
            Some(DiscoveryError::Contract(ContractError::MissingEntryPoint { .. }))
        ));
        assert!(matches!(
            report.rejection_for("two_args.rhai"),
            Some(DiscoveryError::Contract(ContractError::WrongSignature { arity: 2, .. }))
        ));
        assert!(matches!(
            report.rejection_for("broken.rhai"),
            Some(DiscoveryError::Contract(ContractError::Syntax { .. }))
        ));
        assert!(matches!(
            report.rejection_for("explodes.rhai"),
            Some(DiscoveryError::Load(LoadError::Execution(_)))
        ));
    }

    #[test]
    fn test_private_and_foreign_files_are_skipped_silently() {
        let dir = TempDir::new().unwrap();
        write(&dir, "_helpers.rhai", "fn invoke(arguments) { 1 }");
        write(&dir, "notes.txt", "fn invoke(arguments) { 1 }");
        write(&dir, "README.md", "# tools");
        fs::create_dir(dir.path().join("nested.rhai")).unwrap();

        let mut registry = registry(&dir);
        let report = registry.rebuild();
        assert_eq!((report.scanned, report.loaded), (1, 0));
        assert!(report.rejected.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unreadable_entry_does_not_empty_the_pass() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rhai", "fn invoke(arguments) { 1 }");
        write(&dir, "b.rhai", "fn invoke(arguments) { 2 }");

        let entries = vec![
            Ok(dir.path().join("b.rhai")),
            Err(std::io::Error::other("stale handle")),
            Ok(dir.path().join("a.rhai")),
        ];
        let (files, private) = select_candidates(dir.path(), entries);

        let names: Vec<_> = files.iter().map(|(file, ..)| file.as_str()).collect();
        assert_eq!(names, ["a.rhai", "b.rhai"]);
        assert_eq!(private, 0);
    }

    #[test]
    fn test_top_level_import_survives_discovery() {
        let dir = TempDir::new().unwrap();
        write(&dir, "_math.rhai", "fn double(x) { x * 2 }");
        write(
            &dir,
            "doubler.rhai",
            "import \"_math\" as math;\n\nfn invoke(arguments) { math::double(2) }",
        );

        let mut registry = registry(&dir);
        registry.rebuild();

        let module = registry.get("doubler").unwrap().module();
        let result = module.call(rhai::Dynamic::from_map(rhai::Map::new())).unwrap();
        assert_eq!(result.as_int().unwrap(), 4);
    }

    #[test]
    fn test_rebuild_reflects_current_directory() {
        let dir = TempDir::new().unwrap();
        write(&dir, "greet.rhai", GREET);

        let mut registry = registry(&dir);
        registry.rebuild();
        assert!(registry.get("greet").is_some());

        fs::remove_file(dir.path().join("greet.rhai")).unwrap();
        write(&dir, "other.rhai", "fn invoke(arguments) { 2 }");
        registry.rebuild();
        assert!(registry.get("greet").is_none());
        assert!(registry.get("other").is_some());
    }

    #[test]
    fn test_rebuild_picks_up_helper_changes() {
        let dir = TempDir::new().unwrap();
        write(&dir, "_dep.rhai", "throw \"not yet\";");
        write(&dir, "uses_dep.rhai", "import \"_dep\" as dep;\nfn invoke(arguments) { 1 }");

        let mut registry = registry(&dir);
        let report = registry.rebuild();
        assert!(matches!(
            report.rejection_for("uses_dep.rhai"),
            Some(DiscoveryError::Load(LoadError::Dependency(_)))
        ));

        write(&dir, "_dep.rhai", "fn ok() { true }");
        registry.rebuild();
        assert!(registry.get("uses_dep").is_some());
    }

    #[test]
    fn test_list_puts_builtins_first() {
        let dir = TempDir::new().unwrap();
        write(&dir, "greet.rhai", GREET);
        write(&dir, "add.rhai", "fn invoke(arguments) { 0 }");

        let mut registry = registry(&dir);
        registry.rebuild();

        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["write_tool", "add", "greet"]);
    }

    #[test]
    fn test_builtin_shadows_discovered_tool_of_same_name() {
        let dir = TempDir::new().unwrap();
        write(&dir, "write_tool.rhai", "fn invoke(arguments) { \"impostor\" }");

        let mut registry = registry(&dir);
        registry.rebuild();

        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["write_tool", "write_tool"]);
        assert!(matches!(
            registry.resolve("write_tool"),
            Some(ResolvedTool::Builtin(_))
        ));
    }

    #[test]
    fn test_resolve_unknown() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        assert!(registry.resolve("nope").is_none());
    }
}
