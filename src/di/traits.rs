//! Trait definitions for dependency injection

use crate::config::OutputConfig;
use crate::core::version::Version;
use crate::core::DepackResult;
use crate::install::InstallPlan;
use crate::package_manager::PackageManagerKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Trait for configuration access
///
/// Provides read-only access to packer configuration.
/// Implementations should be thread-safe (Send + Sync).
pub trait ConfigProvider: Send + Sync {
    /// Package manager dialect
    fn package_manager(&self) -> PackageManagerKind;

    /// Blacklist entries (exact names or `/regex/`)
    fn blacklist(&self) -> &[String];

    /// Entry name -> source requests
    fn entries(&self) -> BTreeMap<String, Vec<String>>;

    /// Output layout
    fn output(&self) -> &OutputConfig;

    /// Custom install command template
    fn install_command(&self) -> Option<&str>;

    /// Persistent cache directory, already resolved
    fn cache_dir(&self) -> Option<PathBuf>;

    /// Bound on concurrent peer queries
    fn max_concurrent_queries(&self) -> usize;

    /// Prefix for target manifest names
    fn project_name(&self) -> Option<&str>;

    /// Directory relative output paths resolve against
    fn base_dir(&self) -> &Path;
}

/// Trait for package manager operations
///
/// Both operations are subprocess calls in production; they are async so
/// queries and installs for independent packages and targets overlap.
#[async_trait]
pub trait PackageManagerClient: Send + Sync {
    /// Raw stdout of `<tool> info <package>@<version> peerDependencies --json`
    async fn peer_dependencies(&self, package: &str, version: &Version) -> DepackResult<String>;

    /// Run the install command of `plan` in its output directory
    async fn install(&self, plan: &InstallPlan) -> DepackResult<()>;
}
