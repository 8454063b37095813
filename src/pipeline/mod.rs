//! Build, vendor and distribution pipeline.
//!
//! Every public task is a fixed, ordered list of [`Step`]s. Steps write into the
//! staging tree and the distribute steps copy that tree into each target:
//!
//! ```text
//! clean ──► build (skins, containers, skin.css, skin.js, vendors) ──► sync (targets)
//! ```
//!
//! Steps run strictly in order. Non-fatal problems are recorded as [`Issue`]s on the
//! step report; I/O failures stop the run.

pub mod build;
pub mod clean;
pub mod distribute;
pub mod fs;
pub mod vendor;

use crate::compile::Toolchain;
use crate::config::Config;
use crate::error::Issue;
use crate::paths::ThemePaths;
use anyhow::{Context, Result, bail};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// One unit of pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    CleanStaging,
    CleanStagingSkins,
    CleanStagingContainers,
    CleanStagingVendors,
    CleanSkins,
    CleanContainers,
    BuildSkins,
    BuildContainers,
    BuildStylesheet,
    BuildScript,
    CopyVendors,
    FetchVendors,
    DistributeSkins,
    DistributeContainers,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CleanStaging => "clean-staging",
            Step::CleanStagingSkins => "clean-staging-skins",
            Step::CleanStagingContainers => "clean-staging-containers",
            Step::CleanStagingVendors => "clean-staging-vendors",
            Step::CleanSkins => "clean-skins",
            Step::CleanContainers => "clean-containers",
            Step::BuildSkins => "build-skins",
            Step::BuildContainers => "build-containers",
            Step::BuildStylesheet => "build-stylesheet",
            Step::BuildScript => "build-script",
            Step::CopyVendors => "copy-vendors",
            Step::FetchVendors => "fetch-vendors",
            Step::DistributeSkins => "distribute-skins",
            Step::DistributeContainers => "distribute-containers",
        };
        f.write_str(name)
    }
}

/// Named entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Build,
    Sync,
    Distribute,
    Clean,
    Vendors,
    Refresh,
    Watch,
    Init,
}

const BUILD_STEPS: &[Step] = &[
    Step::CleanStaging,
    Step::BuildSkins,
    Step::BuildContainers,
    Step::BuildStylesheet,
    Step::BuildScript,
    Step::CopyVendors,
];

const SYNC_STEPS: &[Step] = &[
    Step::CleanSkins,
    Step::CleanContainers,
    Step::DistributeSkins,
    Step::DistributeContainers,
];

impl Task {
    /// The one-shot steps this task runs, before any watching.
    pub fn steps(self) -> Vec<Step> {
        match self {
            Task::Build => BUILD_STEPS.to_vec(),
            Task::Sync => SYNC_STEPS.to_vec(),
            Task::Distribute | Task::Init => [BUILD_STEPS, SYNC_STEPS].concat(),
            Task::Clean => vec![Step::CleanStaging, Step::CleanSkins, Step::CleanContainers],
            Task::Vendors => vec![Step::FetchVendors],
            Task::Refresh => [&[Step::FetchVendors][..], BUILD_STEPS].concat(),
            Task::Watch => Vec::new(),
        }
    }

    /// Whether the task hands over to the watch orchestrator after its steps.
    pub fn watches(self) -> bool {
        matches!(self, Task::Watch | Task::Init)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Task::Build => "build",
            Task::Sync => "sync",
            Task::Distribute => "distribute",
            Task::Clean => "clean",
            Task::Vendors => "vendors",
            Task::Refresh => "refresh",
            Task::Watch => "watch",
            Task::Init => "init",
        };
        f.write_str(name)
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    /// Files written or directories removed.
    pub count: usize,
    /// Set when the step had nothing to do, with the reason.
    pub skipped: Option<String>,
    pub issues: Vec<Issue>,
}

impl StepReport {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            count: 0,
            skipped: None,
            issues: Vec::new(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn skipped(step: Step, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        info!(step = %step, reason = %reason, "Step skipped");
        Self {
            skipped: Some(reason),
            ..Self::new(step)
        }
    }

    pub fn push_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}

/// Result of an ordered run of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.steps.iter().flat_map(|s| s.issues.iter())
    }

    pub fn has_issues(&self) -> bool {
        self.issues().next().is_some()
    }

    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }
}

/// Configured pipeline. Cheap to clone; the configuration is shared and immutable.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    paths: Arc<ThemePaths>,
    toolchain: Toolchain,
}

impl Pipeline {
    /// Resolve paths against `project_root` and refuse a staging root whose removal
    /// would delete sources, targets or the project itself.
    pub fn new(config: Config, project_root: impl Into<PathBuf>) -> Result<Self> {
        let paths = ThemePaths::new(&config, project_root);
        if let Err(message) = paths.check_staging_root() {
            bail!("invalid distFolder: {}", message);
        }
        Ok(Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            toolchain: Toolchain::default(),
        })
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &ThemePaths {
        &self.paths
    }

    /// Run one step.
    pub fn run_step(&self, step: Step) -> Result<StepReport> {
        let paths = self.paths.as_ref();
        let config = self.config.as_ref();

        let report = match step {
            Step::CleanStaging => clean::clean_staging(paths),
            Step::CleanStagingSkins => clean::clean_staging_skins(paths),
            Step::CleanStagingContainers => clean::clean_staging_containers(paths),
            Step::CleanStagingVendors => clean::clean_staging_vendors(paths),
            Step::CleanSkins => clean::clean_skins(paths),
            Step::CleanContainers => clean::clean_containers(paths),
            Step::BuildSkins => build::build_skins_to_staging(paths),
            Step::BuildContainers => build::build_containers_to_staging(paths),
            Step::BuildStylesheet => build::build_stylesheet(
                paths,
                &config.generated_file_warning,
                self.toolchain.stylesheet.as_ref(),
            ),
            Step::BuildScript => build::build_script(
                paths,
                &config.js_files,
                &config.generated_file_warning,
                self.toolchain.script.as_ref(),
            ),
            Step::CopyVendors => vendor::copy_vendors(paths),
            Step::FetchVendors => vendor::fetch_vendors_from_packages(paths, &config.npm_vendors),
            Step::DistributeSkins => distribute::distribute_skins(paths),
            Step::DistributeContainers => distribute::distribute_containers(paths),
        }
        .with_context(|| format!("step '{}' failed", step))?;

        for issue in &report.issues {
            warn!(step = %step, kind = ?issue.kind, "{}", issue);
        }
        Ok(report)
    }

    /// Run `steps` in order, stopping at the first fatal error.
    pub fn run(&self, steps: &[Step]) -> Result<RunReport> {
        let mut report = RunReport::default();
        for &step in steps {
            let step_report = self.run_step(step)?;
            info!(
                step = %step,
                count = step_report.count,
                issues = step_report.issues.len(),
                "Step finished"
            );
            report.steps.push(step_report);
        }
        Ok(report)
    }

    /// Run the one-shot part of a named task.
    pub fn run_task(&self, task: Task) -> Result<RunReport> {
        info!(task = %task, theme = %self.config.theme_name, "Running task");
        let report = self.run(&task.steps())?;
        info!(
            task = %task,
            steps = report.steps.len(),
            issues = report.issues().count(),
            "Task complete"
        );
        Ok(report)
    }
}
