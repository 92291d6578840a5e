//! Core utilities for Depack.
//!
//! Error types, path helpers, version parsing and the `package.json`
//! manifest model shared by the packer and its CLI.

pub mod core;
pub mod package;

pub use crate::core::error::{DepackError, DepackResult};
pub use crate::core::error_help::{format_error_with_help, ErrorHelp};
