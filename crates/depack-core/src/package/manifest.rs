//! The subset of `package.json` Depack reads and writes.

use crate::core::error::{DepackError, DepackResult};
use crate::core::path::manifest_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A package manifest as found on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Runtime dependencies: package name -> declared version range
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Load `package.json` from a directory
    pub fn load(dir: &Path) -> DepackResult<Self> {
        let path = manifest_path(dir);
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
            .map_err(|e| DepackError::Manifest(format!("{}: {}", path.display(), e)))
    }

    /// Parse manifest JSON
    pub fn parse(content: &str) -> DepackResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Declared runtime range for a package, if any
    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.dependencies.get(name).map(String::as_str)
    }
}

/// The manifest written into a target directory before installing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub dependencies: BTreeMap<String, String>,
}

impl TargetManifest {
    pub fn new(name: Option<String>, dependencies: BTreeMap<String, String>) -> Self {
        Self { name, dependencies }
    }

    /// Pretty JSON with a trailing newline
    pub fn to_json(&self) -> DepackResult<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Write `package.json` into `dir`, which must already exist
    pub fn write(&self, dir: &Path) -> DepackResult<()> {
        if !dir.is_dir() {
            return Err(DepackError::MissingOutputDir(dir.to_path_buf()));
        }
        fs::write(manifest_path(dir), self.to_json()?)?;
        Ok(())
    }
}
