//! Service container for dependency injection

use super::traits::{ConfigProvider, PackageManagerClient};
use crate::config::Config;
use crate::package_manager::LivePackageManager;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds the configuration and package manager client as trait objects so
/// they can be swapped for mocks in tests.
#[derive(Clone)]
pub struct ServiceContainer {
    pub config: Arc<dyn ConfigProvider>,
    pub package_manager: Arc<dyn PackageManagerClient>,
}

impl ServiceContainer {
    /// Create a container backed by the real package manager
    pub fn new(config: Config) -> Self {
        let package_manager =
            LivePackageManager::new(config.package_manager, config.package_manager_bin.clone());

        Self {
            config: Arc::new(config),
            package_manager: Arc::new(package_manager),
        }
    }

    /// Create a service container with custom provider implementations
    ///
    /// This is primarily useful for testing, where you can inject mock
    /// implementations of each service.
    pub fn with_providers(
        config: Arc<dyn ConfigProvider>,
        package_manager: Arc<dyn PackageManagerClient>,
    ) -> Self {
        Self {
            config,
            package_manager,
        }
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    pub fn package_manager(&self) -> Arc<dyn PackageManagerClient> {
        Arc::clone(&self.package_manager)
    }
}
