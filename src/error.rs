//! Error types for configuration loading and pipeline steps.
//!
//! Configuration problems are fatal and surface as [`ConfigError`]. Problems that only
//! affect one unit of work (one stylesheet entry, one vendor package) are recorded as
//! [`Issue`]s on the step report and never abort the pipeline.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors. Any of these aborts before a task runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {}: this file is required to run the pipeline", path.display())]
    MissingConfig { path: PathBuf },

    #[error("{} exists but is empty; provide a valid configuration document", path.display())]
    EmptyConfig { path: PathBuf },

    #[error("{} contains invalid configuration: {message}", path.display())]
    InvalidConfig { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Non-fatal issue categories.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    StylesheetCompileError,
    ScriptMinifyError,
    MissingVendorPackage,
    VendorExtractError,
}

/// A non-fatal problem recorded while running a step.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn stylesheet_compile(entry: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::new(IssueKind::StylesheetCompileError, err.to_string()).with_path(entry)
    }

    pub fn script_minify(output: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::new(IssueKind::ScriptMinifyError, err.to_string()).with_path(output)
    }

    pub fn vendor_extract(vendor: &str, err: &anyhow::Error) -> Self {
        Self::new(
            IssueKind::VendorExtractError,
            format!("vendor '{}' could not be extracted: {:#}", vendor, err),
        )
    }

    pub fn missing_vendor_package(vendor: &str, package: &str, dir: impl Into<PathBuf>) -> Self {
        Self::new(
            IssueKind::MissingVendorPackage,
            format!("package '{}' for vendor '{}' is not installed", package, vendor),
        )
        .with_path(dir)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
