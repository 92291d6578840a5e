//! Single-level peer dependency expansion of a dependency record.

pub mod expander;

pub use expander::{parse_peer_response, PeerDependencyExpander, PeerExpansion};
