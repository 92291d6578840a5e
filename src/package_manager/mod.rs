//! Package manager dialects and the live subprocess client.

pub mod live;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use live::LivePackageManager;

/// Which package manager CLI to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerKind {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManagerKind {
    /// Executable name looked up on PATH
    pub fn program(&self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "npm",
            PackageManagerKind::Yarn => "yarn",
            PackageManagerKind::Pnpm => "pnpm",
        }
    }

    /// Flag naming the cache directory for `install`
    pub fn cache_flag(&self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "--cache",
            PackageManagerKind::Yarn => "--cache-folder",
            PackageManagerKind::Pnpm => "--store-dir",
        }
    }

    /// Arguments for `<tool> info <pkg>@<version> peerDependencies --json`
    pub fn peer_query_args(&self, package: &str, version: &str) -> Vec<String> {
        vec![
            "info".to_string(),
            format!("{}@{}", package, version),
            "peerDependencies".to_string(),
            "--json".to_string(),
        ]
    }

    /// Arguments for `<tool> install [cache-flag] [cache-dir]`
    pub fn install_args(&self, cache_dir: Option<&str>) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        if let Some(dir) = cache_dir {
            args.push(self.cache_flag().to_string());
            args.push(dir.to_string());
        }
        args
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for PackageManagerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(PackageManagerKind::Npm),
            "yarn" => Ok(PackageManagerKind::Yarn),
            "pnpm" => Ok(PackageManagerKind::Pnpm),
            other => Err(format!(
                "Unknown package manager '{}' (expected npm, yarn or pnpm)",
                other
            )),
        }
    }
}
