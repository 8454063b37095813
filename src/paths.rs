//! Output path resolution.
//!
//! Pure path composition from the configuration; nothing here touches the filesystem.
//! Every relative configured path is resolved against the project root.

use crate::config::Config;
use std::path::{Component, Path, PathBuf};

/// Directory name for skin output under a staging or target root.
pub const SKINS_DIR: &str = "Skins";

/// Directory name for container output under a staging or target root.
pub const CONTAINERS_DIR: &str = "Containers";

/// Lexically normalise `path`: drop `.` components and fold `..` into its parent.
///
/// Leading `..` of a relative path are kept; `..` at a filesystem root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether either path contains the other.
fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Skin subtree for `theme_name` under `root`.
pub fn skin_dir(root: &Path, theme_name: &str) -> PathBuf {
    root.join(SKINS_DIR).join(theme_name)
}

/// Container subtree for `theme_name` under `root`.
pub fn container_dir(root: &Path, theme_name: &str) -> PathBuf {
    root.join(CONTAINERS_DIR).join(theme_name)
}

/// All source, staging and target locations for one theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePaths {
    pub theme_name: String,
    pub project_root: PathBuf,
    pub staging_root: PathBuf,
    pub skin_source: PathBuf,
    pub container_source: PathBuf,
    pub scss_dir: PathBuf,
    pub vendor_dir: PathBuf,
    pub packages_dir: PathBuf,
    pub target_roots: Vec<PathBuf>,
}

impl ThemePaths {
    pub fn new(config: &Config, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let resolve = |p: &Path| project_root.join(p);

        Self {
            theme_name: config.theme_name.clone(),
            staging_root: resolve(config.dist_folder.as_path()),
            skin_source: resolve(config.skin_source.as_path()),
            container_source: resolve(config.container_source.as_path()),
            scss_dir: resolve(config.scss_dir.as_path()),
            vendor_dir: resolve(config.vendor_dir.as_path()),
            packages_dir: resolve(config.packages_dir.as_path()),
            target_roots: config.target_paths.iter().map(|p| resolve(p.as_path())).collect(),
            project_root,
        }
    }

    pub fn staging_skin_dir(&self) -> PathBuf {
        skin_dir(&self.staging_root, &self.theme_name)
    }

    pub fn staging_container_dir(&self) -> PathBuf {
        container_dir(&self.staging_root, &self.theme_name)
    }

    /// Where the committed vendor directory lands inside the staged skin.
    pub fn staging_vendor_dir(&self) -> PathBuf {
        self.staging_skin_dir().join("vendors")
    }

    pub fn target_skin_dirs(&self) -> Vec<PathBuf> {
        self.target_roots
            .iter()
            .map(|root| skin_dir(root, &self.theme_name))
            .collect()
    }

    pub fn target_container_dirs(&self) -> Vec<PathBuf> {
        self.target_roots
            .iter()
            .map(|root| container_dir(root, &self.theme_name))
            .collect()
    }

    /// Check that deleting the staging root cannot remove anything it should not.
    ///
    /// The staging root may not be the project root or one of its ancestors, and may
    /// not contain or sit inside a source tree or a target root.
    pub fn check_staging_root(&self) -> Result<(), String> {
        let absolute = |p: &Path| {
            std::path::absolute(p)
                .map(|p| normalize(&p))
                .map_err(|e| format!("cannot resolve {}: {}", p.display(), e))
        };
        let staging = absolute(&self.staging_root)?;
        let project = absolute(&self.project_root)?;

        if project.starts_with(&staging) {
            return Err(format!(
                "distFolder {} is the project root or one of its ancestors",
                staging.display()
            ));
        }

        let sources = [
            ("skinSource", &self.skin_source),
            ("containerSource", &self.container_source),
            ("scssDir", &self.scss_dir),
            ("vendorDir", &self.vendor_dir),
            ("packagesDir", &self.packages_dir),
        ];
        for (name, dir) in sources {
            if overlaps(&staging, &absolute(dir)?) {
                return Err(format!(
                    "distFolder {} overlaps {} {}",
                    staging.display(),
                    name,
                    dir.display()
                ));
            }
        }
        for target in &self.target_roots {
            if overlaps(&staging, &absolute(target)?) {
                return Err(format!(
                    "distFolder {} overlaps target path {}",
                    staging.display(),
                    target.display()
                ));
            }
        }
        Ok(())
    }

    /// Installed package directory for a vendor manifest entry.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.packages_dir.join(package)
    }

    /// Extraction destination for a named vendor.
    pub fn vendor_output_dir(&self, vendor: &str) -> PathBuf {
        self.vendor_dir.join(vendor)
    }
}
