//! Version tracking for synchronized components.
//!
//! - comparison: tag normalization and the numeric-aware
//!   "is the remote newer" decision
//! - [`VersionRegistry`]: one durable record per component identifier

mod compare;
mod registry;

pub use compare::{compare_versions, is_remote_newer, normalize};
pub use registry::{sanitize_identifier, VersionRegistry};
