//! The finalized module graph handed over by the bundler.
//!
//! Every module is tagged once by the bundler integration as internal
//! (first-party source), external (a third-party request left out of the
//! bundle) or a synthetic multi-entry merge node. Importer back-references
//! form the reverse-connection index walked by entry attribution.

pub mod entries;

use crate::core::path::{parent_dir, resolve_from};
use crate::core::{DepackError, DepackResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use entries::{entries_reaching, EntryAttribution};

/// Identity of a module within one graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a module is, decided by the bundler integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleKind {
    /// First-party source compiled into the bundle
    Internal { resource: PathBuf },
    /// A request left external, to be satisfied by an installed package
    External {
        /// Directory of the module that issued the request
        issuer_dir: PathBuf,
        /// Where the request resolved on disk, if it resolved at all
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved: Option<PathBuf>,
    },
    /// Synthetic node merging the sources of a multi-source entry
    MultiEntry,
}

impl ModuleKind {
    fn resolve_paths(&mut self, base: &Path) {
        match self {
            ModuleKind::Internal { resource } => {
                let absolute = resolve_from(base, resource.as_path());
                *resource = absolute;
            }
            ModuleKind::External {
                issuer_dir,
                resolved,
            } => {
                let absolute = resolve_from(base, issuer_dir.as_path());
                *issuer_dir = absolute;
                if let Some(path) = resolved {
                    let absolute = resolve_from(base, path.as_path());
                    *path = absolute;
                }
            }
            ModuleKind::MultiEntry => {}
        }
    }
}

/// One reverse edge: who caused a module to be included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Importer {
    /// The module is named directly by the entry configuration
    Entry,
    /// The module is imported by another module
    Module { id: ModuleId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    /// Raw request as written by the importer (e.g. `lodash/fp`, `./src/main`)
    pub request: String,
    pub kind: ModuleKind,
    #[serde(default)]
    pub importers: Vec<Importer>,
}

impl Module {
    pub fn internal(id: impl Into<String>, request: impl Into<String>, resource: impl Into<PathBuf>) -> Self {
        Self {
            id: ModuleId::new(id),
            request: request.into(),
            kind: ModuleKind::Internal {
                resource: resource.into(),
            },
            importers: Vec::new(),
        }
    }

    pub fn external(id: impl Into<String>, request: impl Into<String>, issuer_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: ModuleId::new(id),
            request: request.into(),
            kind: ModuleKind::External {
                issuer_dir: issuer_dir.into(),
                resolved: None,
            },
            importers: Vec::new(),
        }
    }

    pub fn multi_entry(id: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            id: ModuleId::new(id),
            request: request.into(),
            kind: ModuleKind::MultiEntry,
            importers: Vec::new(),
        }
    }

    pub fn is_multi_entry(&self) -> bool {
        matches!(self.kind, ModuleKind::MultiEntry)
    }

    /// View this module as an external request, if it is one
    pub fn as_external(&self) -> Option<ExternalRequest<'_>> {
        match &self.kind {
            ModuleKind::External {
                issuer_dir,
                resolved,
            } => Some(ExternalRequest {
                id: &self.id,
                request: &self.request,
                issuer_dir,
                resolved: resolved.as_deref(),
            }),
            _ => None,
        }
    }
}

/// A third-party request discovered in the graph
#[derive(Debug, Clone, Copy)]
pub struct ExternalRequest<'a> {
    pub id: &'a ModuleId,
    pub request: &'a str,
    pub issuer_dir: &'a Path,
    pub resolved: Option<&'a Path>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphFile {
    modules: Vec<Module>,
}

/// Module graph keyed by module identity
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: BTreeMap<ModuleId, Module>,
}

impl ModuleGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph exported by the bundler integration
    ///
    /// Relative paths in the file resolve against the file's own directory.
    pub fn load(path: &Path) -> DepackResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DepackError::Graph(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let base = fs::canonicalize(parent_dir(path)?)?;
        Self::parse(&content, Some(&base))
    }

    /// Parse and validate the JSON exchange format; paths must be absolute
    pub fn from_json(content: &str) -> DepackResult<Self> {
        Self::parse(content, None)
    }

    fn parse(content: &str, base: Option<&Path>) -> DepackResult<Self> {
        let file: GraphFile = serde_json::from_str(content)
            .map_err(|e| DepackError::Graph(format!("Invalid module graph: {}", e)))?;

        let mut graph = Self::new();
        for mut module in file.modules {
            if let Some(base) = base {
                module.kind.resolve_paths(base);
            }
            graph.add_module(module)?;
        }
        graph.validate()?;
        Ok(graph)
    }

    /// Add a module; ids must be unique
    pub fn add_module(&mut self, module: Module) -> DepackResult<()> {
        if self.modules.contains_key(&module.id) {
            return Err(DepackError::Graph(format!(
                "Duplicate module id '{}'",
                module.id
            )));
        }
        self.modules.insert(module.id.clone(), module);
        Ok(())
    }

    /// Record that `from` imports `to` (a forward edge, stored reversed)
    pub fn add_import(&mut self, from: &ModuleId, to: &ModuleId) -> DepackResult<()> {
        if !self.modules.contains_key(from) {
            return Err(DepackError::Graph(format!("Module '{}' not found in graph", from)));
        }
        let target = self
            .modules
            .get_mut(to)
            .ok_or_else(|| DepackError::Graph(format!("Module '{}' not found in graph", to)))?;

        let edge = Importer::Module { id: from.clone() };
        if !target.importers.contains(&edge) {
            target.importers.push(edge);
        }
        Ok(())
    }

    /// Record that the entry configuration names `id` directly
    pub fn mark_entry(&mut self, id: &ModuleId) -> DepackResult<()> {
        let module = self
            .modules
            .get_mut(id)
            .ok_or_else(|| DepackError::Graph(format!("Module '{}' not found in graph", id)))?;
        if !module.importers.contains(&Importer::Entry) {
            module.importers.push(Importer::Entry);
        }
        Ok(())
    }

    /// Check that every importer edge points at a known module and that
    /// every external request carries an absolute issuer directory
    pub fn validate(&self) -> DepackResult<()> {
        for module in self.modules.values() {
            if let ModuleKind::External { issuer_dir, .. } = &module.kind {
                if !issuer_dir.has_root() {
                    return Err(DepackError::Graph(format!(
                        "Module '{}' has relative issuer_dir '{}'",
                        module.id,
                        issuer_dir.display()
                    )));
                }
            }
            for importer in &module.importers {
                if let Importer::Module { id } = importer {
                    if !self.modules.contains_key(id) {
                        return Err(DepackError::Graph(format!(
                            "Module '{}' lists unknown importer '{}'",
                            module.id, id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// All external requests, in module id order
    pub fn externals(&self) -> impl Iterator<Item = ExternalRequest<'_>> {
        self.modules.values().filter_map(Module::as_external)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
