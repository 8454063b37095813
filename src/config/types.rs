//! Configuration types.

use crate::paths::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, PathBuf};

/// Default staging folder name.
pub const DEFAULT_DIST_FOLDER: &str = "dist";

/// Script pattern used when neither config file names `jsFiles`.
pub const DEFAULT_JS_FILES: &str = "src/js/**/*.js";

/// Effective pipeline configuration, built once from the merged documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Theme identifier, used as the leaf directory under `Skins/` and `Containers/`.
    pub theme_name: String,

    /// Installed-application roots receiving the theme, in distribution order.
    #[serde(default)]
    pub target_paths: Vec<PathBuf>,

    /// Staging folder holding built artifacts before distribution.
    #[serde(default = "default_dist_folder")]
    pub dist_folder: PathBuf,

    /// Banner written atop generated `skin.css` and `skin.js`.
    #[serde(default)]
    pub generated_file_warning: String,

    /// Script glob patterns, concatenated in match order.
    #[serde(default = "default_js_files")]
    pub js_files: Vec<String>,

    /// Vendor name to installed package extraction rules.
    #[serde(default)]
    pub npm_vendors: BTreeMap<String, VendorPackage>,

    #[serde(default = "default_skin_source")]
    pub skin_source: PathBuf,

    #[serde(default = "default_container_source")]
    pub container_source: PathBuf,

    /// Directory holding stylesheet sources and partials.
    #[serde(default = "default_scss_dir")]
    pub scss_dir: PathBuf,

    /// Committed vendor directory, copied into the staging skin output.
    #[serde(default = "default_vendor_dir")]
    pub vendor_dir: PathBuf,

    /// Installed-package tree read by vendor extraction.
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,
}

/// One vendor manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPackage {
    /// Installed package directory name under the packages tree.
    pub package: String,
    /// File patterns relative to the package directory.
    #[serde(default)]
    pub files: Vec<String>,
}

fn default_dist_folder() -> PathBuf {
    PathBuf::from(DEFAULT_DIST_FOLDER)
}

fn default_js_files() -> Vec<String> {
    vec![DEFAULT_JS_FILES.to_string()]
}

fn default_skin_source() -> PathBuf {
    PathBuf::from("skin")
}

fn default_container_source() -> PathBuf {
    PathBuf::from("container")
}

fn default_scss_dir() -> PathBuf {
    PathBuf::from("src/scss")
}

fn default_vendor_dir() -> PathBuf {
    PathBuf::from("vendors")
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

impl Config {
    /// Build a configuration with every optional field at its default.
    pub fn new(theme_name: impl Into<String>) -> Self {
        Self {
            theme_name: theme_name.into(),
            target_paths: Vec::new(),
            dist_folder: default_dist_folder(),
            generated_file_warning: String::new(),
            js_files: default_js_files(),
            npm_vendors: BTreeMap::new(),
            skin_source: default_skin_source(),
            container_source: default_container_source(),
            scss_dir: default_scss_dir(),
            vendor_dir: default_vendor_dir(),
            packages_dir: default_packages_dir(),
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.theme_name.trim();
        if name.is_empty() {
            return Err("themeName must not be empty".to_string());
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(format!(
                "themeName '{}' must be a single directory name",
                self.theme_name
            ));
        }
        let dist = normalize(&self.dist_folder);
        let names_a_directory = dist
            .components()
            .any(|c| matches!(c, Component::Normal(_)));
        if !names_a_directory {
            return Err(format!(
                "distFolder '{}' must name a dedicated staging directory, not the project root, \
                 one of its ancestors or the filesystem root",
                self.dist_folder.display()
            ));
        }
        for (vendor, entry) in &self.npm_vendors {
            if entry.package.trim().is_empty() {
                return Err(format!("npmVendors.{}.package must not be empty", vendor));
            }
        }
        Ok(())
    }
}
