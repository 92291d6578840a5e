//! Package manager client that shells out to npm, yarn or pnpm.

use super::PackageManagerKind;
use crate::core::version::Version;
use crate::core::{DepackError, DepackResult};
use crate::di::traits::PackageManagerClient;
use crate::install::InstallPlan;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Runs the configured package manager as a subprocess
#[derive(Debug, Clone)]
pub struct LivePackageManager {
    kind: PackageManagerKind,
    program_override: Option<PathBuf>,
}

impl LivePackageManager {
    pub fn new(kind: PackageManagerKind, program_override: Option<PathBuf>) -> Self {
        Self {
            kind,
            program_override,
        }
    }

    /// Resolve the executable, preferring an explicit override over PATH lookup
    ///
    /// Resolution is deferred to the first call so that runs which never reach
    /// the package manager do not require it to be installed.
    fn program(&self) -> DepackResult<PathBuf> {
        if let Some(ref program) = self.program_override {
            return Ok(program.clone());
        }
        which::which(self.kind.program()).map_err(|e| {
            DepackError::PackageManager(format!(
                "'{}' not found on PATH: {}",
                self.kind.program(),
                e
            ))
        })
    }

    async fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> DepackResult<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(program = %program.display(), ?args, "spawning package manager");
        cmd.output().await.map_err(|e| {
            DepackError::PackageManager(format!("Failed to run {}: {}", program.display(), e))
        })
    }

    fn check(command: String, output: &Output) -> DepackResult<()> {
        if output.status.success() {
            return Ok(());
        }
        Err(DepackError::SubprocessFailed {
            command,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[async_trait]
impl PackageManagerClient for LivePackageManager {
    async fn peer_dependencies(&self, package: &str, version: &Version) -> DepackResult<String> {
        let program = self.program()?;
        let args = self.kind.peer_query_args(package, &version.to_string());
        let output = self.run(&program, &args, None).await?;
        Self::check(
            format!("{} {}", self.kind.program(), args.join(" ")),
            &output,
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn install(&self, plan: &InstallPlan) -> DepackResult<()> {
        let program = match plan.command.program {
            Some(ref custom) => {
                which::which(custom).unwrap_or_else(|_| PathBuf::from(custom))
            }
            None => self.program()?,
        };
        let output = self
            .run(&program, &plan.command.args, Some(&plan.output_dir))
            .await?;
        Self::check(plan.command.display(self.kind), &output)
    }
}
