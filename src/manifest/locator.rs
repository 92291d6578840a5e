use super::Manifest;
use crate::core::package::manifest::PackageManifest;
use crate::core::path::find_manifest_dirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds every ancestor manifest of a directory, closest first
///
/// Parsed manifests are cached by directory for the lifetime of the locator,
/// since many requests in one graph share the same ancestors.
#[derive(Debug, Default)]
pub struct ManifestLocator {
    cache: HashMap<PathBuf, Option<Arc<Manifest>>>,
}

impl ManifestLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered ancestor manifests of `start`, nearest first
    ///
    /// Never fails: unreadable or malformed manifests are skipped with a warning,
    /// and a directory with no manifest above it yields an empty list.
    pub fn locate(&mut self, start: &Path) -> Vec<Arc<Manifest>> {
        find_manifest_dirs(start)
            .into_iter()
            .filter_map(|dir| self.load(dir))
            .collect()
    }

    fn load(&mut self, dir: PathBuf) -> Option<Arc<Manifest>> {
        if let Some(cached) = self.cache.get(&dir) {
            return cached.clone();
        }

        let loaded = match PackageManifest::load(&dir) {
            Ok(package) => {
                debug!(dir = %dir.display(), "loaded package manifest");
                Some(Arc::new(Manifest::new(dir.clone(), package)))
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable package manifest");
                None
            }
        };
        self.cache.insert(dir, loaded.clone());
        loaded
    }
}
