//! Attribution of external requests and accumulation per entry.

pub mod accumulator;
pub mod attributor;
pub mod blacklist;
pub mod builtins;

pub use accumulator::{DependencyAccumulator, DependencyRecord};
pub use attributor::{Attribution, ModuleAttributor};
pub use blacklist::Blacklist;
