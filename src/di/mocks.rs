//! Mock implementations of service traits for testing

use super::traits::{ConfigProvider, PackageManagerClient};
use crate::config::OutputConfig;
use crate::core::version::Version;
use crate::core::{DepackError, DepackResult};
use crate::install::InstallPlan;
use crate::package_manager::PackageManagerKind;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Mock configuration provider for testing
///
/// # Example
///
/// ```
/// use depack::di::mocks::MockConfigProvider;
/// use depack::di::ConfigProvider;
///
/// let mut config = MockConfigProvider::default();
/// config.blacklist = vec!["aws-sdk".to_string()];
///
/// assert_eq!(config.blacklist(), ["aws-sdk".to_string()]);
/// ```
#[derive(Clone)]
pub struct MockConfigProvider {
    pub package_manager: PackageManagerKind,
    pub blacklist: Vec<String>,
    pub entries: BTreeMap<String, Vec<String>>,
    pub output: OutputConfig,
    pub install_command: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub max_concurrent_queries: usize,
    pub project_name: Option<String>,
    pub base_dir: PathBuf,
}

impl Default for MockConfigProvider {
    fn default() -> Self {
        Self {
            package_manager: PackageManagerKind::Npm,
            blacklist: Vec::new(),
            entries: BTreeMap::new(),
            output: OutputConfig::default(),
            install_command: None,
            cache_dir: None,
            max_concurrent_queries: 10,
            project_name: None,
            base_dir: PathBuf::from("/tmp/depack-test"),
        }
    }
}

impl MockConfigProvider {
    /// Add an entry with its source requests
    pub fn with_entry(mut self, name: &str, sources: &[&str]) -> Self {
        self.entries.insert(
            name.to_string(),
            sources.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl ConfigProvider for MockConfigProvider {
    fn package_manager(&self) -> PackageManagerKind {
        self.package_manager
    }

    fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    fn entries(&self) -> BTreeMap<String, Vec<String>> {
        self.entries.clone()
    }

    fn output(&self) -> &OutputConfig {
        &self.output
    }

    fn install_command(&self) -> Option<&str> {
        self.install_command.as_deref()
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone()
    }

    fn max_concurrent_queries(&self) -> usize {
        self.max_concurrent_queries
    }

    fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[derive(Default)]
struct MockPackageManagerState {
    peer_responses: HashMap<String, Result<String, String>>,
    install_failures: HashMap<String, (i32, String)>,
    queries: Vec<String>,
    installs: Vec<InstallPlan>,
}

/// Mock package manager for testing
///
/// Peer queries answer from canned stdout (empty when nothing is registered);
/// installs are recorded and succeed unless a failure was registered for the
/// target. A successful install creates the plan's cache directory, as a real
/// package manager would.
///
/// # Example
///
/// ```
/// use depack::di::mocks::MockPackageManager;
///
/// let pm = MockPackageManager::new()
///     .with_peers("pkg", "1.0.0", r#"{"type":"inline","data":{"peer-a":"^2.0.0"}}"#);
/// assert!(pm.queries().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct MockPackageManager {
    state: Arc<Mutex<MockPackageManagerState>>,
}

impl MockPackageManager {
    /// Create a new mock package manager
    pub fn new() -> Self {
        Self::default()
    }

    fn key(package: &str, version: &str) -> String {
        format!("{}@{}", package, version)
    }

    /// Answer the peer query for `package@version` with `stdout`
    pub fn with_peers(self, package: &str, version: &str, stdout: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .peer_responses
            .insert(Self::key(package, version), Ok(stdout.to_string()));
        self
    }

    /// Make the peer query for `package@version` fail
    pub fn with_failing_peers(self, package: &str, version: &str) -> Self {
        self.state.lock().unwrap().peer_responses.insert(
            Self::key(package, version),
            Err(format!("404 Not Found: {}@{}", package, version)),
        );
        self
    }

    /// Make the install for `target` exit with `code`
    pub fn with_failing_install(self, target: &str, code: i32, stderr: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .install_failures
            .insert(target.to_string(), (code, stderr.to_string()));
        self
    }

    /// Peer queries issued so far, as `package@version`
    pub fn queries(&self) -> Vec<String> {
        let mut queries = self.state.lock().unwrap().queries.clone();
        queries.sort();
        queries
    }

    /// Install plans run so far
    pub fn installs(&self) -> Vec<InstallPlan> {
        self.state.lock().unwrap().installs.clone()
    }
}

#[async_trait]
impl PackageManagerClient for MockPackageManager {
    async fn peer_dependencies(&self, package: &str, version: &Version) -> DepackResult<String> {
        let key = Self::key(package, &version.to_string());
        let mut state = self.state.lock().unwrap();
        state.queries.push(key.clone());

        match state.peer_responses.get(&key) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err(stderr)) => Err(DepackError::SubprocessFailed {
                command: format!("npm info {} peerDependencies --json", key),
                code: 1,
                stderr: stderr.clone(),
            }),
            None => Ok(String::new()),
        }
    }

    async fn install(&self, plan: &InstallPlan) -> DepackResult<()> {
        let mut state = self.state.lock().unwrap();
        state.installs.push(plan.clone());

        if let Some((code, stderr)) = state.install_failures.get(&plan.target) {
            return Err(DepackError::SubprocessFailed {
                command: plan.command.display(PackageManagerKind::Npm),
                code: *code,
                stderr: stderr.clone(),
            });
        }

        std::fs::create_dir_all(&plan.cache.path)?;
        Ok(())
    }
}
