//! Theme Pipeline Library
//!
//! This module exports the configuration loader, the build pipeline and the source
//! watcher for the binary and for integration tests.

pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod watcher;
