//! Turning accumulated records into one install plan per target.

use super::TargetFailure;
use crate::config::{CACHE_DIR_PLACEHOLDER, NAME_PLACEHOLDER};
use crate::core::package::manifest::TargetManifest;
use crate::core::path::SCRATCH_CACHE_DIR;
use crate::core::{DepackError, DepackResult};
use crate::di::ConfigProvider;
use crate::package_manager::PackageManagerKind;
use crate::resolver::DependencyAccumulator;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Target name used when all entries install into one directory
pub const COMBINED_TARGET: &str = "combined";

/// Package cache handed to the install command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDir {
    pub path: PathBuf,
    /// Created for this install only; removed once it succeeds
    pub scratch: bool,
}

/// The subprocess an install runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    /// Executable from a custom template; `None` runs the configured package manager
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl InstallCommand {
    /// `<tool> install <cache-flag> <cache-dir>` in the given dialect
    pub fn dialect(kind: PackageManagerKind, cache: &CacheDir) -> Self {
        Self {
            program: None,
            args: kind.install_args(Some(&cache.path.to_string_lossy())),
        }
    }

    /// Split a whitespace-separated template, substituting `{cache_dir}`
    pub fn from_template(template: &str, cache: &CacheDir) -> DepackResult<Self> {
        let cache_dir = cache.path.to_string_lossy();
        let mut parts = template
            .split_whitespace()
            .map(|part| part.replace(CACHE_DIR_PLACEHOLDER, &cache_dir));

        let program = parts.next().ok_or_else(|| {
            DepackError::Config("install_command must not be empty".to_string())
        })?;

        Ok(Self {
            program: Some(program),
            args: parts.collect(),
        })
    }

    /// Human-readable command line for messages
    pub fn display(&self, kind: PackageManagerKind) -> String {
        let program = self.program.as_deref().unwrap_or(kind.program());
        if self.args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, self.args.join(" "))
        }
    }
}

/// Everything needed to install one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub target: String,
    pub output_dir: PathBuf,
    pub manifest: TargetManifest,
    pub cache: CacheDir,
    pub command: InstallCommand,
}

/// Derives install plans from configuration and accumulated records
pub struct TargetPlanner<'a> {
    config: &'a dyn ConfigProvider,
}

impl<'a> TargetPlanner<'a> {
    pub fn new(config: &'a dyn ConfigProvider) -> Self {
        Self { config }
    }

    /// One plan per target, or a failure for each target that cannot be planned
    ///
    /// Output collisions are detected here, before any manifest is written.
    /// Every target that would share a manifest path fails; the others are
    /// planned normally.
    pub fn plan(
        &self,
        accumulator: &DependencyAccumulator,
    ) -> (Vec<InstallPlan>, Vec<TargetFailure>) {
        let entries = self.config.entries();
        if entries.is_empty() {
            warn!("no entries configured; nothing to install");
            return (Vec::new(), Vec::new());
        }

        let output = self.config.output();
        let base_dir = self.config.base_dir();

        if output.combined {
            let sources: Vec<String> = entries.values().flatten().cloned().collect();
            let result = output
                .combined_dir(base_dir)
                .and_then(|dir| self.build(COMBINED_TARGET, None, dir, accumulator.merged(&sources)));
            return match result {
                Ok(plan) => (vec![plan], Vec::new()),
                Err(e) => (Vec::new(), vec![TargetFailure::new(COMBINED_TARGET, e)]),
            };
        }

        if entries.len() > 1 && !output.separates_entries() {
            let dir = output.target_dir(base_dir, "");
            let failures = entries
                .keys()
                .map(|name| {
                    TargetFailure::new(
                        name.as_str(),
                        DepackError::OutputCollision(format!(
                            "{} entries would all write {}/package.json because the output template has no {} placeholder",
                            entries.len(),
                            dir.display(),
                            NAME_PLACEHOLDER
                        )),
                    )
                })
                .collect();
            return (Vec::new(), failures);
        }

        let mut by_dir: BTreeMap<PathBuf, Vec<&String>> = BTreeMap::new();
        for name in entries.keys() {
            by_dir
                .entry(output.target_dir(base_dir, name))
                .or_default()
                .push(name);
        }

        let mut plans = Vec::new();
        let mut failures = Vec::new();
        for (dir, names) in by_dir {
            if names.len() > 1 {
                let listed = names
                    .iter()
                    .map(|n| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                for name in &names {
                    failures.push(TargetFailure::new(
                        name.as_str(),
                        DepackError::OutputCollision(format!(
                            "entries {} all resolve to {}",
                            listed,
                            dir.display()
                        )),
                    ));
                }
                continue;
            }

            let name = names[0];
            let record = accumulator.merged(&entries[name]);
            match self.build(name.as_str(), Some(name.as_str()), dir, record) {
                Ok(plan) => plans.push(plan),
                Err(e) => failures.push(TargetFailure::new(name.as_str(), e)),
            }
        }

        (plans, failures)
    }

    fn build(
        &self,
        target: &str,
        entry: Option<&str>,
        output_dir: PathBuf,
        dependencies: BTreeMap<String, String>,
    ) -> DepackResult<InstallPlan> {
        let name = self
            .config
            .project_name()
            .map(|project| match entry {
                Some(entry) => format!("{}-{}", project, entry),
                None => project.to_string(),
            });

        let cache = match self.config.cache_dir() {
            Some(path) => CacheDir {
                path,
                scratch: false,
            },
            None => CacheDir {
                path: output_dir.join(SCRATCH_CACHE_DIR),
                scratch: true,
            },
        };

        let command = match self.config.install_command() {
            Some(template) => InstallCommand::from_template(template, &cache)?,
            None => InstallCommand::dialect(self.config.package_manager(), &cache),
        };

        Ok(InstallPlan {
            target: target.to_string(),
            output_dir,
            manifest: TargetManifest::new(name, dependencies),
            cache,
            command,
        })
    }
}
