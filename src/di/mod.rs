//! Dependency injection infrastructure for Depack
//!
//! Configuration and the package manager sit behind traits so the packer can
//! run against canned responses in tests.
//!
//! # Example (Production)
//! ```no_run
//! use depack::config::Config;
//! use depack::di::ServiceContainer;
//! use std::path::Path;
//!
//! # fn example() -> depack::core::DepackResult<()> {
//! let config = Config::load(Path::new("depack.yaml"))?;
//! let container = ServiceContainer::new(config);
//! # Ok(())
//! # }
//! ```
//!
//! # Example (Testing)
//! ```
//! use depack::di::{ServiceContainer, mocks::*};
//! use std::sync::Arc;
//!
//! let config = Arc::new(MockConfigProvider::default());
//! let package_manager = Arc::new(MockPackageManager::new());
//!
//! let container = ServiceContainer::with_providers(config, package_manager);
//! ```

pub mod container;
pub mod mocks;
pub mod traits;

// Re-export key types
pub use container::ServiceContainer;
pub use traits::{ConfigProvider, PackageManagerClient};
