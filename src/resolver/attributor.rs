//! Maps an external request back to a declared package and the entries needing it.

use super::blacklist::Blacklist;
use super::builtins::is_builtin;
use crate::graph::{entries_reaching, EntryAttribution, ExternalRequest, ModuleGraph};
use crate::manifest::{Manifest, ManifestLocator};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of attributing one external request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// A platform module; never packed
    Builtin,
    /// No ancestor manifest declares the request or any prefix of it
    Unresolved,
    /// Declared, but excluded by the blacklist
    Blacklisted { name: String },
    /// Declared and needed by `entries`
    Attributed {
        name: String,
        range: String,
        entries: EntryAttribution,
    },
}

impl Attribution {
    /// The resolved package name, when the request resolved at all
    pub fn package_name(&self) -> Option<&str> {
        match self {
            Attribution::Blacklisted { name } | Attribution::Attributed { name, .. } => {
                Some(name.as_str())
            }
            Attribution::Builtin | Attribution::Unresolved => None,
        }
    }
}

/// A declaration found for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub range: String,
}

/// Candidate package names for a request, longest first
///
/// `@scope/pkg/lib/util` yields `@scope/pkg/lib/util`, `@scope/pkg/lib`,
/// `@scope/pkg`, `@scope`.
pub fn candidate_names(request: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut candidate = request.trim_end_matches('/');

    while !candidate.is_empty() {
        candidates.push(candidate);
        candidate = match candidate.rfind('/') {
            Some(pos) => &candidate[..pos],
            None => "",
        };
    }

    candidates
}

/// Find the declaration for a request among closest-first manifests
///
/// The longest matching candidate wins; for one candidate the closest
/// manifest declaring it wins.
pub fn find_declaration(request: &str, manifests: &[Arc<Manifest>]) -> Option<Declaration> {
    candidate_names(request).into_iter().find_map(|candidate| {
        manifests.iter().find_map(|manifest| {
            manifest.dependency(candidate).map(|range| Declaration {
                name: candidate.to_string(),
                range: range.to_string(),
            })
        })
    })
}

/// Resolves external requests against ancestor manifests
#[derive(Debug)]
pub struct ModuleAttributor {
    locator: ManifestLocator,
    blacklist: Blacklist,
}

impl ModuleAttributor {
    pub fn new(blacklist: Blacklist) -> Self {
        Self::with_locator(ManifestLocator::new(), blacklist)
    }

    pub fn with_locator(locator: ManifestLocator, blacklist: Blacklist) -> Self {
        Self { locator, blacklist }
    }

    /// Attribute one external request found in `graph`
    ///
    /// Nothing here is fatal: unresolved requests are skipped with a warning and
    /// blacklisted packages with an informational message.
    pub fn attribute(&mut self, graph: &ModuleGraph, request: &ExternalRequest<'_>) -> Attribution {
        if is_builtin(request.request) {
            debug!(request = request.request, "skipping platform module");
            return Attribution::Builtin;
        }

        let manifests = self.locator.locate(request.issuer_dir);
        let Some(declaration) = find_declaration(request.request, &manifests) else {
            warn!(
                request = request.request,
                issuer_dir = %request.issuer_dir.display(),
                "no ancestor package.json declares this module; skipping"
            );
            return Attribution::Unresolved;
        };

        if self.blacklist.matches(&declaration.name) {
            info!(package = %declaration.name, "package is blacklisted; not packing");
            return Attribution::Blacklisted {
                name: declaration.name,
            };
        }

        let entries = entries_reaching(graph, request.id);
        debug!(
            package = %declaration.name,
            range = %declaration.range,
            entries = entries.len(),
            "attributed external module"
        );

        Attribution::Attributed {
            name: declaration.name,
            range: declaration.range,
            entries,
        }
    }
}
