use crate::core::package::manifest::PackageManifest;
use crate::core::path::{normalize_path, parent_dir, resolve_from};
use crate::core::{DepackError, DepackResult};
use crate::di::ConfigProvider;
use crate::package_manager::PackageManagerKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the entry name in output templates
pub const NAME_PLACEHOLDER: &str = "[name]";

/// Placeholder substituted with the cache directory in `install_command`
pub const CACHE_DIR_PLACEHOLDER: &str = "{cache_dir}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Package manager dialect: npm (default), yarn or pnpm
    #[serde(default)]
    pub package_manager: PackageManagerKind,

    /// Explicit package manager executable; looked up on PATH when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager_bin: Option<PathBuf>,

    /// Package names never packed: exact names or `/regex/` patterns
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Entry name -> one or more source requests, as given to the bundler
    #[serde(default)]
    pub entries: BTreeMap<String, EntrySources>,

    /// Where the bundler writes each entry
    #[serde(default)]
    pub output: OutputConfig,

    /// Replaces `<tool> install [cache-flag] [cache-dir]`
    /// Example: "npm ci --cache {cache_dir}"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,

    /// Persistent package cache shared by all targets
    ///
    /// When unset each target gets a scratch cache inside its directory that is
    /// removed after a successful install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Upper bound on concurrent peer dependency queries per target
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Prefix for target manifest names; read from ./package.json when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Directory relative paths resolve against (the config file's directory)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// One or several source requests for an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySources {
    One(String),
    Many(Vec<String>),
}

impl EntrySources {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            EntrySources::One(source) => vec![source.clone()],
            EntrySources::Many(sources) => sources.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory; may contain `[name]`
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Per-entry bundle file name; directories in it may contain `[name]`
    /// Example: "[name]/[name].js"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Install every entry into one shared directory with one manifest
    #[serde(default)]
    pub combined: bool,
}

fn default_output_path() -> String {
    format!(".webpack/{}", NAME_PLACEHOLDER)
}

fn default_max_concurrent_queries() -> usize {
    10
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: None,
            combined: false,
        }
    }
}

impl OutputConfig {
    /// Whether each entry gets its own directory
    pub fn separates_entries(&self) -> bool {
        self.path.contains(NAME_PLACEHOLDER)
            || self
                .filename
                .as_deref()
                .and_then(|f| Path::new(f).parent())
                .is_some_and(|dir| dir.to_string_lossy().contains(NAME_PLACEHOLDER))
    }

    /// Directory the bundle (and so the manifest) for `entry` lands in
    pub fn target_dir(&self, base_dir: &Path, entry: &str) -> PathBuf {
        let path = self.path.replace(NAME_PLACEHOLDER, entry);
        let mut dir = resolve_from(base_dir, Path::new(&path));

        if let Some(ref filename) = self.filename {
            let filename = filename.replace(NAME_PLACEHOLDER, entry);
            if let Some(parent) = Path::new(&filename).parent() {
                dir = normalize_path(&dir.join(parent));
            }
        }

        dir
    }

    /// Directory shared by all entries when `combined` is set
    pub fn combined_dir(&self, base_dir: &Path) -> DepackResult<PathBuf> {
        if self.separates_entries() {
            return Err(DepackError::Config(format!(
                "output.combined is set but the output template contains {}",
                NAME_PLACEHOLDER
            )));
        }
        Ok(self.target_dir(base_dir, ""))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_manager: PackageManagerKind::default(),
            package_manager_bin: None,
            blacklist: Vec::new(),
            entries: BTreeMap::new(),
            output: OutputConfig::default(),
            install_command: None,
            cache_dir: None,
            max_concurrent_queries: default_max_concurrent_queries(),
            project_name: None,
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    ///
    /// Relative paths inside resolve against the file's directory. When no
    /// project name is configured it is taken from the package.json next to
    /// the config file, if there is one.
    pub fn load(path: &Path) -> DepackResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DepackError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&content)?;
        config.base_dir = parent_dir(path)?;

        if config.project_name.is_none() {
            config.project_name = PackageManifest::load(&config.base_dir)
                .ok()
                .and_then(|manifest| manifest.name);
        }

        Ok(config)
    }

    /// Parse config YAML without touching the filesystem
    pub fn parse(content: &str) -> DepackResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| DepackError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DepackResult<()> {
        if self.max_concurrent_queries == 0 {
            return Err(DepackError::Config(
                "max_concurrent_queries must be at least 1".to_string(),
            ));
        }
        if let Some((name, _)) = self.entries.iter().find(|(_, s)| s.to_vec().is_empty()) {
            return Err(DepackError::Config(format!(
                "Entry '{}' has no sources",
                name
            )));
        }
        if let Some(ref template) = self.install_command {
            if template.split_whitespace().next().is_none() {
                return Err(DepackError::Config(
                    "install_command must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// Implement ConfigProvider trait
impl ConfigProvider for Config {
    fn package_manager(&self) -> PackageManagerKind {
        self.package_manager
    }

    fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    fn entries(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(name, sources)| (name.clone(), sources.to_vec()))
            .collect()
    }

    fn output(&self) -> &OutputConfig {
        &self.output
    }

    fn install_command(&self) -> Option<&str> {
        self.install_command.as_deref()
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| resolve_from(&self.base_dir, dir))
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
