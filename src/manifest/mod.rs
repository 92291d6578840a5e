//! Package manifests discovered above the modules of the graph.

pub mod locator;

use crate::core::package::manifest::PackageManifest;
use std::path::{Path, PathBuf};

pub use locator::ManifestLocator;

/// A parsed `package.json` and the directory it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub dir: PathBuf,
    pub package: PackageManifest,
}

impl Manifest {
    pub fn new(dir: impl Into<PathBuf>, package: PackageManifest) -> Self {
        Self {
            dir: dir.into(),
            package,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> Option<&str> {
        self.package.name.as_deref()
    }

    /// Declared runtime range for `name`
    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.package.dependency(name)
    }
}
