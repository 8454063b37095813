//! Integration tests for watch mode.
//!
//! Each source kind's sequence is run against a distributed project to check the
//! rebuild, clean and redistribute chain. A final test drives the real debounced
//! watcher with a file write.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use theme_pipeline::compile::{ScriptMinifier, StylesheetCompiler, Toolchain};
use theme_pipeline::config::{ConfigLoader, ConfigPaths};
use theme_pipeline::pipeline::{Pipeline, Task};
use theme_pipeline::watcher::{
    SourceKind, WatchPaths, WatcherConfig, classify_path, start_source_watcher,
};

/// Stylesheet "compiler" that emits the entry source unchanged.
struct PassthroughCss;

impl StylesheetCompiler for PassthroughCss {
    fn compile(&self, entry: &Path, _load_dir: &Path) -> Result<String, String> {
        fs::read_to_string(entry).map_err(|e| e.to_string())
    }
}

/// Script "minifier" that keeps the bundle unchanged.
struct PassthroughJs;

impl ScriptMinifier for PassthroughJs {
    fn minify(&self, source: &str) -> Result<String, String> {
        Ok(source.to_string())
    }
}

fn touch(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Lay out a project with one target, distribute it once and return the pipeline.
fn distributed_project(root: &Path) -> Pipeline {
    touch(&root.join("skin/home.ascx"), "<home/>");
    touch(&root.join("container/box.ascx"), "<box/>");
    touch(&root.join("src/scss/skin.scss"), ".v1{}");
    touch(&root.join("src/js/menu.js"), "var v1 = 1");
    touch(&root.join("vendors/lib/old.js"), "old");

    let site = root.join("site");
    fs::write(
        root.join("config.json"),
        format!(r#"{{"themeName": "Acme", "targetPaths": [{:?}]}}"#, site),
    )
    .unwrap();
    let paths = ConfigPaths::with_files(root.join("config.json"), root.join("config-local.json"));
    let config = ConfigLoader::load_with_paths(paths).unwrap().into_config();

    let toolchain = Toolchain::new(Arc::new(PassthroughCss), Arc::new(PassthroughJs));
    let pipeline = Pipeline::new(config, root).unwrap().with_toolchain(toolchain);
    pipeline.run_task(Task::Distribute).unwrap();
    pipeline
}

#[test]
fn test_skin_change_redistributes_skin() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);
    let skin = root.join("site/Skins/Acme");

    fs::remove_file(root.join("skin/home.ascx")).unwrap();
    touch(&root.join("skin/landing.ascx"), "<landing/>");
    pipeline.run(&SourceKind::Skin.steps()).unwrap();

    assert!(!skin.join("home.ascx").exists());
    assert_eq!(read(&skin.join("landing.ascx")), "<landing/>");
    assert_eq!(read(&skin.join("skin.css")), "\n.v1{}");
    assert_eq!(read(&skin.join("skin.js")), "\nvar v1 = 1");
    assert!(skin.join("vendors/lib/old.js").is_file());
    assert!(root.join("site/Containers/Acme/box.ascx").is_file());
}

#[test]
fn test_container_change_redistributes_containers_only() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);

    fs::remove_file(root.join("container/box.ascx")).unwrap();
    touch(&root.join("container/panel.ascx"), "<panel/>");
    pipeline.run(&SourceKind::Container.steps()).unwrap();

    let containers = root.join("site/Containers/Acme");
    assert!(!containers.join("box.ascx").exists());
    assert_eq!(read(&containers.join("panel.ascx")), "<panel/>");
    assert!(root.join("site/Skins/Acme/home.ascx").is_file());
}

#[test]
fn test_stylesheet_change_updates_target_css() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);

    touch(&root.join("src/scss/skin.scss"), ".v2{}");
    pipeline.run(&SourceKind::Stylesheet.steps()).unwrap();

    let skin = root.join("site/Skins/Acme");
    assert_eq!(read(&skin.join("skin.css")), "\n.v2{}");
    assert!(skin.join("home.ascx").is_file());
}

#[test]
fn test_script_change_updates_and_removes_bundle() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);
    let bundle = root.join("site/Skins/Acme/skin.js");

    touch(&root.join("src/js/menu.js"), "var v2 = 2");
    pipeline.run(&SourceKind::Script.steps()).unwrap();
    assert_eq!(read(&bundle), "\nvar v2 = 2");

    fs::remove_file(root.join("src/js/menu.js")).unwrap();
    pipeline.run(&SourceKind::Script.steps()).unwrap();
    assert!(!bundle.exists());
    assert!(!pipeline.paths().staging_skin_dir().join("skin.js").exists());
}

#[test]
fn test_vendor_removal_reaches_targets() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);
    let vendors = root.join("site/Skins/Acme/vendors");
    assert!(vendors.join("lib/old.js").is_file());

    fs::remove_file(root.join("vendors/lib/old.js")).unwrap();
    touch(&root.join("vendors/lib/new.js"), "new");
    pipeline.run(&SourceKind::Vendor.steps()).unwrap();

    assert!(!vendors.join("lib/old.js").exists());
    assert!(!pipeline.paths().staging_vendor_dir().join("lib/old.js").exists());
    assert_eq!(read(&vendors.join("lib/new.js")), "new");
    assert!(root.join("site/Skins/Acme/skin.css").is_file());
}

#[test]
fn test_build_output_is_not_a_source() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);
    let paths = WatchPaths::for_pipeline(&pipeline);

    let staged = fs::canonicalize(pipeline.paths().staging_skin_dir().join("skin.js")).unwrap();
    let deployed = fs::canonicalize(root.join("site/Skins/Acme/home.ascx")).unwrap();
    assert_eq!(classify_path(&staged, &paths), None);
    assert_eq!(classify_path(&deployed, &paths), None);

    let source = fs::canonicalize(root.join("src/js/menu.js")).unwrap();
    assert_eq!(classify_path(&source, &paths), Some(SourceKind::Script));
}

#[tokio::test]
async fn test_watcher_reports_stylesheet_write() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let pipeline = distributed_project(root);

    let config = WatcherConfig {
        debounce_duration: Duration::from_millis(100),
        serialize: false,
    };
    let mut handle = start_source_watcher(WatchPaths::for_pipeline(&pipeline), &config).unwrap();

    touch(&root.join("src/scss/_colors.scss"), "$c: red;");

    let seen = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(kinds) = handle.next_batch().await {
            if kinds.contains(&SourceKind::Stylesheet) {
                return true;
            }
        }
        false
    })
    .await
    .expect("no stylesheet change reported in time");
    assert!(seen);
}
