//! Third-party vendor files.
//!
//! Two independent operations: extracting selected files from installed packages into
//! the committed vendor directory, and copying that directory into the staged skin.

use super::fs::{copy_file, copy_tree, expand_patterns};
use super::{Step, StepReport};
use crate::config::VendorPackage;
use crate::error::Issue;
use crate::paths::ThemePaths;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Copy the vendor directory into `<staging skin>/vendors`.
pub fn copy_vendors(paths: &ThemePaths) -> Result<StepReport> {
    if !paths.vendor_dir.is_dir() {
        return Ok(StepReport::skipped(
            Step::CopyVendors,
            format!("vendor directory {} not found", paths.vendor_dir.display()),
        ));
    }

    let dest = paths.staging_vendor_dir();
    let copied = copy_tree(&paths.vendor_dir, &dest)?;
    info!(to = %dest.display(), copied, "Copied vendor files");
    Ok(StepReport::new(Step::CopyVendors).with_count(copied))
}

/// Extract manifest files from installed packages into `<vendorDir>/<vendor>`.
///
/// Each vendor is isolated: a missing package, a bad pattern or a failed copy is
/// reported as an issue and the remaining vendors still run.
pub fn fetch_vendors_from_packages(
    paths: &ThemePaths,
    manifest: &BTreeMap<String, VendorPackage>,
) -> Result<StepReport> {
    let step = Step::FetchVendors;
    if manifest.is_empty() {
        return Ok(StepReport::skipped(step, "no vendor manifest configured"));
    }

    let mut report = StepReport::new(step);
    let mut copied = 0;

    for (vendor, entry) in manifest {
        let package_dir = paths.package_dir(&entry.package);
        if !package_dir.is_dir() {
            warn!(
                vendor = %vendor,
                package = %entry.package,
                path = %package_dir.display(),
                "Vendor package not installed, skipping"
            );
            report.push_issue(Issue::missing_vendor_package(
                vendor,
                &entry.package,
                &package_dir,
            ));
            continue;
        }

        match extract_vendor(paths, vendor, entry, &package_dir) {
            Ok(n) => copied += n,
            Err(e) => {
                warn!(vendor = %vendor, error = %format!("{:#}", e), "Vendor extraction failed");
                report.push_issue(Issue::vendor_extract(vendor, &e));
            }
        }
    }

    Ok(report.with_count(copied))
}

fn extract_vendor(
    paths: &ThemePaths,
    vendor: &str,
    entry: &VendorPackage,
    package_dir: &Path,
) -> Result<usize> {
    let dest = paths.vendor_output_dir(vendor);
    let matches = expand_patterns(package_dir, &entry.files)?;
    if matches.is_empty() {
        warn!(vendor = %vendor, package = %entry.package, "Vendor patterns matched no files");
    }
    for m in &matches {
        let target = dest.join(&m.relative);
        copy_file(&m.path, &target)?;
        debug!(vendor = %vendor, file = %target.display(), "Extracted");
    }
    info!(vendor = %vendor, package = %entry.package, files = matches.len(), "Vendor extracted");
    Ok(matches.len())
}
