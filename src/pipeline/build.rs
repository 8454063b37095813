//! Build steps writing into the staging tree.

use super::fs::{copy_tree, expand_patterns, remove_tree, write_file};
use super::{Step, StepReport};
use crate::compile::{ScriptMinifier, StylesheetCompiler};
use crate::error::Issue;
use crate::paths::ThemePaths;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Fixed name of the compiled stylesheet.
pub const STYLESHEET_OUTPUT: &str = "skin.css";

/// Fixed name of the bundled script.
pub const SCRIPT_OUTPUT: &str = "skin.js";

/// Prefix generated content with the banner line.
pub fn with_banner(banner: &str, body: &str) -> String {
    format!("{}\n{}", banner, body)
}

fn copy_source_tree(step: Step, src: &Path, dest: &Path) -> Result<StepReport> {
    if !src.is_dir() {
        return Ok(StepReport::skipped(
            step,
            format!("source {} not found", src.display()),
        ));
    }
    let copied = copy_tree(src, dest)?;
    debug!(from = %src.display(), to = %dest.display(), copied, "Copied source tree");
    Ok(StepReport::new(step).with_count(copied))
}

pub fn build_skins_to_staging(paths: &ThemePaths) -> Result<StepReport> {
    copy_source_tree(
        Step::BuildSkins,
        &paths.skin_source,
        &paths.staging_skin_dir(),
    )
}

pub fn build_containers_to_staging(paths: &ThemePaths) -> Result<StepReport> {
    copy_source_tree(
        Step::BuildContainers,
        &paths.container_source,
        &paths.staging_container_dir(),
    )
}

/// Remove a generated file whose sources are gone.
fn remove_stale(output: &Path) -> Result<()> {
    if remove_tree(output).with_context(|| format!("failed to remove {}", output.display()))? {
        info!(output = %output.display(), "Removed stale output");
    }
    Ok(())
}

/// Stylesheet entry points under `dir`, sorted. Files starting with `_` are partials.
pub fn stylesheet_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            let ext = e.path().extension().and_then(|x| x.to_str());
            !name.starts_with('_') && matches!(ext, Some("scss") | Some("sass"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    entries.sort();
    entries
}

/// Compile every stylesheet entry into `skin.css`.
///
/// A failing entry is reported as an issue and left out. When no entry compiles,
/// the previous `skin.css` (if any) is left untouched; when there are no entries at
/// all it is removed.
pub fn build_stylesheet(
    paths: &ThemePaths,
    banner: &str,
    compiler: &dyn StylesheetCompiler,
) -> Result<StepReport> {
    let step = Step::BuildStylesheet;
    let output = paths.staging_skin_dir().join(STYLESHEET_OUTPUT);
    let entries = if paths.scss_dir.is_dir() {
        stylesheet_entries(&paths.scss_dir)
    } else {
        Vec::new()
    };
    if entries.is_empty() {
        remove_stale(&output)?;
        return Ok(StepReport::skipped(
            step,
            format!("no stylesheet entries in {}", paths.scss_dir.display()),
        ));
    }

    let mut report = StepReport::new(step);
    let mut compiled = Vec::with_capacity(entries.len());
    for entry in &entries {
        match compiler.compile(entry, &paths.scss_dir) {
            Ok(css) => compiled.push(css),
            Err(e) => {
                error!(entry = %entry.display(), error = %e, "Stylesheet compile error");
                report.push_issue(Issue::stylesheet_compile(entry, e));
            }
        }
    }

    if compiled.is_empty() {
        return Ok(report);
    }

    write_file(&output, &with_banner(banner, compiled.join("\n").trim_end()))?;
    info!(output = %output.display(), entries = compiled.len(), "Wrote stylesheet");
    Ok(report.with_count(1))
}

/// Concatenate the scripts matched by `patterns`, minify, and write `skin.js`.
///
/// Files are joined in match order: pattern order first, then the glob matcher's
/// alphabetical order within each pattern. With no matches the staged bundle is
/// removed. A bundle that fails to minify is written as is and reported.
pub fn build_script(
    paths: &ThemePaths,
    patterns: &[String],
    banner: &str,
    minifier: &dyn ScriptMinifier,
) -> Result<StepReport> {
    let step = Step::BuildScript;
    let output = paths.staging_skin_dir().join(SCRIPT_OUTPUT);
    let matches = expand_patterns(&paths.project_root, patterns)?;
    if matches.is_empty() {
        remove_stale(&output)?;
        return Ok(StepReport::skipped(step, "no script sources matched"));
    }

    let mut sources = Vec::with_capacity(matches.len());
    for m in &matches {
        let source = std::fs::read_to_string(&m.path)
            .with_context(|| format!("failed to read {}", m.path.display()))?;
        sources.push(source);
    }

    let mut report = StepReport::new(step);
    let joined = sources.join("\n");
    let bundle = match minifier.minify(&joined) {
        Ok(minified) => minified,
        Err(e) => {
            error!(
                output = %output.display(),
                error = %e,
                "Script minify error, writing unminified bundle"
            );
            report.push_issue(Issue::script_minify(&output, e));
            joined
        }
    };
    write_file(&output, &with_banner(banner, &bundle))?;
    info!(output = %output.display(), sources = matches.len(), "Wrote script bundle");
    Ok(report.with_count(1))
}
