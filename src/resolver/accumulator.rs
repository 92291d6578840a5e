//! Per-entry accumulation of attributed packages.

use crate::graph::EntryAttribution;
use std::collections::BTreeMap;
use tracing::warn;

/// Package name -> declared version range, for one entry or target
pub type DependencyRecord = BTreeMap<String, String>;

/// Builds a dependency record per entry root during one pass over the graph
#[derive(Debug, Clone, Default)]
pub struct DependencyAccumulator {
    records: BTreeMap<String, DependencyRecord>,
}

impl DependencyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name = range` for every attributed entry
    ///
    /// A different range for a key already recorded replaces it (last write
    /// wins); the replacement is logged.
    pub fn record(&mut self, entries: &EntryAttribution, name: &str, range: &str) {
        for entry in entries.iter() {
            let record = self.records.entry(entry.to_string()).or_default();
            if let Some(previous) = replace_range(record, name, range) {
                warn!(
                    entry,
                    package = name,
                    previous = %previous,
                    range,
                    "conflicting version ranges; keeping the last one seen"
                );
            }
        }
    }

    /// The record for one entry root
    pub fn record_for(&self, entry: &str) -> Option<&DependencyRecord> {
        self.records.get(entry)
    }

    /// Union of the records of several entry roots, in the given order
    ///
    /// Sources disagreeing on a range resolve like `record`: the later source
    /// wins and the conflict is logged.
    pub fn merged<S: AsRef<str>>(&self, entries: &[S]) -> DependencyRecord {
        let mut merged = DependencyRecord::new();
        for entry in entries {
            let entry = entry.as_ref();
            if let Some(record) = self.records.get(entry) {
                for (name, range) in record {
                    if let Some(previous) = replace_range(&mut merged, name, range) {
                        warn!(
                            entry,
                            package = %name,
                            previous = %previous,
                            range = %range,
                            "conflicting version ranges across entry sources; keeping the last one seen"
                        );
                    }
                }
            }
        }
        merged
    }

    /// Entry roots with at least one recorded package
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Set `name = range`, returning the previous range when it differed
fn replace_range(record: &mut DependencyRecord, name: &str, range: &str) -> Option<String> {
    record
        .insert(name.to_string(), range.to_string())
        .filter(|previous| previous != range)
}
