//! Forced, idempotent deletion of staging and target subtrees.

use super::fs::remove_tree;
use super::{Step, StepReport};
use crate::paths::ThemePaths;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

fn remove_all(step: Step, dirs: &[PathBuf]) -> Result<StepReport> {
    let mut removed = 0;
    for dir in dirs {
        if remove_tree(dir).with_context(|| format!("failed to remove {}", dir.display()))? {
            debug!(path = %dir.display(), "Removed");
            removed += 1;
        }
    }
    Ok(StepReport::new(step).with_count(removed))
}

/// Remove the whole staging root.
pub fn clean_staging(paths: &ThemePaths) -> Result<StepReport> {
    remove_all(Step::CleanStaging, std::slice::from_ref(&paths.staging_root))
}

pub fn clean_staging_skins(paths: &ThemePaths) -> Result<StepReport> {
    remove_all(Step::CleanStagingSkins, &[paths.staging_skin_dir()])
}

pub fn clean_staging_containers(paths: &ThemePaths) -> Result<StepReport> {
    remove_all(Step::CleanStagingContainers, &[paths.staging_container_dir()])
}

/// Remove the vendor copy inside the staged skin.
pub fn clean_staging_vendors(paths: &ThemePaths) -> Result<StepReport> {
    remove_all(Step::CleanStagingVendors, &[paths.staging_vendor_dir()])
}

/// Remove `Skins/<theme>` under every target.
pub fn clean_skins(paths: &ThemePaths) -> Result<StepReport> {
    remove_all(Step::CleanSkins, &paths.target_skin_dirs())
}

/// Remove `Containers/<theme>` under every target.
pub fn clean_containers(paths: &ThemePaths) -> Result<StepReport> {
    remove_all(Step::CleanContainers, &paths.target_container_dirs())
}
