use std::path::PathBuf;
use thiserror::Error;

pub type DepackResult<T> = Result<T, DepackError>;

#[derive(Error, Debug)]
pub enum DepackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Module graph error: {0}")]
    Graph(String),

    #[error("Package manager error: {0}")]
    PackageManager(String),

    /// The bundler did not produce the directory a target installs into.
    #[error("Output directory does not exist: {}", .0.display())]
    MissingOutputDir(PathBuf),

    /// The package manager exited with a non-zero status code.
    #[error("`{command}` exited with code {code}: {stderr}")]
    SubprocessFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Several targets would write the same manifest.
    #[error("Output collision: {0}")]
    OutputCollision(String),

    /// One or more targets failed to install.
    /// Should exit with code 1.
    #[error("{0} target(s) failed")]
    TargetsFailed(usize),
}
