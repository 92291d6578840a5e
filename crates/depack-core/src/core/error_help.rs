//! Corrective hints attached to errors shown by the CLI.

use crate::core::error::DepackError;

/// Suggests a fix for an error, when one is known.
pub trait ErrorHelp {
    fn help(&self) -> Option<String>;
}

impl ErrorHelp for DepackError {
    fn help(&self) -> Option<String> {
        match self {
            DepackError::MissingOutputDir(_) => Some(
                "Run the bundler before packing; each target installs into the directory it emitted."
                    .to_string(),
            ),
            DepackError::OutputCollision(_) => Some(
                "Add a `[name]` placeholder to `output.path` or to a directory in `output.filename`, \
                 or set `output.combined: true` to install all entries into one directory."
                    .to_string(),
            ),
            DepackError::SubprocessFailed { command, .. } => Some(format!(
                "Re-run `{}` in the target directory to see the full package manager output.",
                command
            )),
            DepackError::PackageManager(_) => Some(
                "Check that the configured package manager is installed and on PATH, \
                 or set `package_manager_bin`."
                    .to_string(),
            ),
            DepackError::Yaml(_) | DepackError::Config(_) => {
                Some("Check depack.yaml against the documented configuration keys.".to_string())
            }
            DepackError::Graph(_) => Some(
                "The module graph must be the JSON export written by the bundler integration."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Format an error followed by its hint, if any.
pub fn format_error_with_help(error: &DepackError) -> String {
    match error.help() {
        Some(help) => format!("Error: {}\n\n  help: {}", error, help),
        None => format!("Error: {}", error),
    }
}
