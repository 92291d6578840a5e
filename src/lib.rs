//! Depack: runtime dependency packing for bundled JavaScript entries
//!
//! The bundler keeps third-party packages external. Depack walks the
//! finalized module graph, attributes each external module to the package
//! and version declared by the closest `package.json`, and installs exactly
//! those packages (plus their peers) next to each entry's bundle output.

pub use depack_core::package::manifest::{PackageManifest, TargetManifest};
pub use depack_core::{format_error_with_help, DepackError, DepackResult, ErrorHelp};

/// Core module re-exported from depack-core.
pub mod core {
    pub use depack_core::core::*;
    pub use depack_core::*;
}

/// Configuration (`depack.yaml`).
pub mod config;

/// Dependency injection infrastructure.
pub mod di;

/// Bundler module graph and entry attribution.
pub mod graph;

/// `package.json` discovery.
pub mod manifest;

/// Module attribution and per-entry accumulation.
pub mod resolver;

/// npm, yarn and pnpm dialects.
pub mod package_manager;

/// Peer dependency expansion.
pub mod peers;

/// Install planning and execution.
pub mod install;

/// The packer pipeline.
pub mod packer;

pub use packer::{AttributionSummary, DependencyPacker, PackReport};
