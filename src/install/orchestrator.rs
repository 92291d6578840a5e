use super::InstallPlan;
use crate::core::{DepackError, DepackResult};
use crate::di::PackageManagerClient;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Writes a target's manifest and runs the package manager install in its directory
pub struct InstallOrchestrator {
    client: Arc<dyn PackageManagerClient>,
}

impl InstallOrchestrator {
    /// Create a new orchestrator with an injected package manager
    pub fn new(client: Arc<dyn PackageManagerClient>) -> Self {
        Self { client }
    }

    /// Install one target
    ///
    /// The output directory must already exist; nothing is written and the
    /// package manager is not started when it does not. A non-zero exit fails
    /// the target with the captured stderr. A scratch cache is removed after
    /// a successful install; failing to remove it is only logged.
    pub async fn install_for(&self, plan: &InstallPlan) -> DepackResult<()> {
        if !plan.output_dir.is_dir() {
            return Err(DepackError::MissingOutputDir(plan.output_dir.clone()));
        }

        plan.manifest.write(&plan.output_dir)?;
        info!(
            target_name = %plan.target,
            packages = plan.manifest.dependencies.len(),
            dir = %plan.output_dir.display(),
            "installing packages"
        );

        self.client.install(plan).await?;

        if plan.cache.scratch {
            remove_scratch_cache(&plan.cache.path).await;
        }

        info!(target_name = %plan.target, "finished installing packages");
        Ok(())
    }
}

async fn remove_scratch_cache(path: &Path) {
    if !path.exists() {
        return;
    }
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!(path = %path.display(), "removed scratch cache"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch cache"),
    }
}
