//! Reverse-import walk from a module to the entry roots that include it.

use super::{Importer, ModuleGraph, ModuleId, ModuleKind};
use std::collections::{BTreeSet, HashSet};

/// The entry roots (by raw request, e.g. `./src/main`) reaching a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryAttribution(BTreeSet<String>);

impl EntryAttribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: impl Into<String>) {
        self.0.insert(entry.into());
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.contains(entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for EntryAttribution {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Walk importers of importers from `start` until entry roots are reached
///
/// A root is a first-party module named by an entry edge, a module with no
/// importers at all, or a source directly under a multi-entry merge node. Merge
/// nodes are never roots themselves; the walk passes through them. The walk is
/// iterative with a visited set, so cyclic graphs terminate.
pub fn entries_reaching(graph: &ModuleGraph, start: &ModuleId) -> EntryAttribution {
    let mut entries = EntryAttribution::new();
    let mut visited: HashSet<&ModuleId> = HashSet::new();
    let mut stack: Vec<&ModuleId> = vec![start];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(module) = graph.module(id) else {
            continue;
        };

        let can_be_root = matches!(module.kind, ModuleKind::Internal { .. });
        if module.importers.is_empty() && can_be_root {
            entries.insert(module.request.as_str());
        }

        for importer in &module.importers {
            match importer {
                Importer::Entry => {
                    if can_be_root {
                        entries.insert(module.request.as_str());
                    }
                }
                Importer::Module { id: parent_id } => {
                    let parent_is_merge = graph
                        .module(parent_id)
                        .is_some_and(|parent| parent.is_multi_entry());
                    if parent_is_merge && can_be_root {
                        entries.insert(module.request.as_str());
                    }
                    stack.push(parent_id);
                }
            }
        }
    }

    entries
}
