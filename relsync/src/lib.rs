//! relsync - keeps GitHub-released components installed and up to date
//!
//! This library checks the latest release of each configured component,
//! downloads and unpacks newer versions, and merges them into a shared
//! installation directory. Installed versions are recorded per component so
//! unchanged releases are never downloaded twice.
//!
//! - [`component`]: component specs and asset selectors
//! - [`version`]: version comparison and the on-disk version registry
//! - [`manager`]: resolver, downloader, extractor, merge engine and the
//!   [`Synchronizer`](manager::Synchronizer)
//! - [`config`]: INI configuration and environment overrides
//! - [`logging`]: tracing subscriber setup

pub mod component;
pub mod config;
pub mod logging;
pub mod manager;
pub mod version;
