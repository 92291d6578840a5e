//! Per-target manifests and the package manager install step.

pub mod orchestrator;
pub mod plan;

use crate::core::DepackError;
use thiserror::Error;

pub use orchestrator::InstallOrchestrator;
pub use plan::{CacheDir, InstallCommand, InstallPlan, TargetPlanner};

/// A target that could not be planned or installed
#[derive(Debug, Error)]
#[error("{target}: {error}")]
pub struct TargetFailure {
    pub target: String,
    #[source]
    pub error: DepackError,
}

impl TargetFailure {
    pub fn new(target: impl Into<String>, error: DepackError) -> Self {
        Self {
            target: target.into(),
            error,
        }
    }
}
