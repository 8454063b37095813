//! Copy the staging tree into every target path.

use super::fs::copy_tree;
use super::{Step, StepReport};
use crate::paths::ThemePaths;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn distribute(step: Step, staged: &Path, targets: &[PathBuf]) -> Result<StepReport> {
    if targets.is_empty() {
        return Ok(StepReport::skipped(step, "no target paths configured"));
    }
    if !staged.is_dir() {
        warn!(path = %staged.display(), "Nothing staged to distribute");
        return Ok(StepReport::skipped(
            step,
            format!("staging directory {} not found", staged.display()),
        ));
    }

    let mut copied = 0;
    for target in targets {
        let n = copy_tree(staged, target)?;
        info!(target = %target.display(), files = n, "Distributed");
        copied += n;
    }
    Ok(StepReport::new(step).with_count(copied))
}

/// Copy `<staging>/Skins/<theme>` to each target, in configuration order.
pub fn distribute_skins(paths: &ThemePaths) -> Result<StepReport> {
    distribute(
        Step::DistributeSkins,
        &paths.staging_skin_dir(),
        &paths.target_skin_dirs(),
    )
}

/// Copy `<staging>/Containers/<theme>` to each target, in configuration order.
pub fn distribute_containers(paths: &ThemePaths) -> Result<StepReport> {
    distribute(
        Step::DistributeContainers,
        &paths.staging_container_dir(),
        &paths.target_container_dirs(),
    )
}
