//! Source watcher driving rebuild-and-distribute sequences.
//!
//! Watches for changes to:
//! - the skin and container source trees
//! - the stylesheet directory
//! - the script glob bases
//! - the vendor directory
//!
//! Changes are debounced, classified into [`SourceKind`]s and each kind runs a fixed
//! step sequence. Sequences from separate batches are not coordinated unless
//! [`WatcherConfig::serialize`] is set.

use crate::pipeline::fs::glob_base;
use crate::pipeline::{Pipeline, Step};
use anyhow::Result;
use notify::Watcher;
use notify_debouncer_mini::{DebouncedEventKind, new_debouncer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

/// Which source tree a change belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Skin,
    Container,
    Stylesheet,
    Script,
    Vendor,
}

impl SourceKind {
    /// Steps to run after a change: rebuild the artifact, clean the matching target
    /// subtree, redistribute.
    pub fn steps(self) -> Vec<Step> {
        match self {
            SourceKind::Skin => vec![
                Step::CleanStagingSkins,
                Step::BuildSkins,
                Step::BuildStylesheet,
                Step::BuildScript,
                Step::CopyVendors,
                Step::CleanSkins,
                Step::DistributeSkins,
            ],
            SourceKind::Container => vec![
                Step::CleanStagingContainers,
                Step::BuildContainers,
                Step::CleanContainers,
                Step::DistributeContainers,
            ],
            SourceKind::Stylesheet => {
                vec![Step::BuildStylesheet, Step::CleanSkins, Step::DistributeSkins]
            }
            SourceKind::Script => vec![Step::BuildScript, Step::CleanSkins, Step::DistributeSkins],
            SourceKind::Vendor => vec![
                Step::CleanStagingVendors,
                Step::CopyVendors,
                Step::CleanSkins,
                Step::DistributeSkins,
            ],
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Skin => write!(f, "skin"),
            SourceKind::Container => write!(f, "container"),
            SourceKind::Stylesheet => write!(f, "stylesheet"),
            SourceKind::Script => write!(f, "script"),
            SourceKind::Vendor => write!(f, "vendor"),
        }
    }
}

/// Configuration for the source watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration for coalescing rapid changes.
    pub debounce_duration: Duration,
    /// Run triggered sequences one at a time instead of overlapping.
    pub serialize: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(500),
            serialize: false,
        }
    }
}

/// Absolute roots and patterns to watch.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    pub skin_dir: PathBuf,
    pub container_dir: PathBuf,
    pub scss_dir: PathBuf,
    pub vendor_dir: PathBuf,
    pub script_patterns: Vec<glob::Pattern>,
    pub script_roots: Vec<PathBuf>,
    /// Output trees whose changes never trigger a rebuild.
    pub ignored: Vec<PathBuf>,
}

impl WatchPaths {
    /// Derive watch locations from a pipeline's resolved paths.
    pub fn for_pipeline(pipeline: &Pipeline) -> Self {
        let paths = pipeline.paths();
        let root = absolute(&paths.project_root);

        let mut script_patterns = Vec::new();
        let mut script_roots = Vec::new();
        for pattern in &pipeline.config().js_files {
            let base = root.join(glob_base(pattern));
            let rest = Path::new(pattern)
                .strip_prefix(glob_base(pattern))
                .unwrap_or(Path::new(pattern));
            let full = format!(
                "{}/{}",
                glob::Pattern::escape(&absolute(&base).to_string_lossy()),
                rest.to_string_lossy()
            );
            match glob::Pattern::new(&full) {
                Ok(p) => script_patterns.push(p),
                Err(e) => warn!(pattern = %pattern, error = %e, "Invalid script pattern, not watched"),
            }
            script_roots.push(absolute(&base));
        }

        Self {
            skin_dir: absolute(&paths.skin_source),
            container_dir: absolute(&paths.container_source),
            scss_dir: absolute(&paths.scss_dir),
            vendor_dir: absolute(&paths.vendor_dir),
            script_patterns,
            script_roots,
            ignored: std::iter::once(&paths.staging_root)
                .chain(&paths.target_roots)
                .map(|p| absolute(p))
                .collect(),
        }
    }

    fn roots(&self) -> Vec<&Path> {
        let mut roots = vec![
            self.skin_dir.as_path(),
            self.container_dir.as_path(),
            self.scss_dir.as_path(),
            self.vendor_dir.as_path(),
        ];
        roots.extend(self.script_roots.iter().map(PathBuf::as_path));
        roots.sort();
        roots.dedup();
        roots
    }
}

/// Canonical form of `path` when it exists, so event paths compare equal.
fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Classify one changed path.
///
/// Script patterns win over directory membership, so a script kept inside the skin
/// tree only rebuilds the bundle.
pub fn classify_path(path: &Path, paths: &WatchPaths) -> Option<SourceKind> {
    if paths.ignored.iter().any(|dir| path.starts_with(dir)) {
        return None;
    }
    if paths.script_patterns.iter().any(|p| p.matches_path(path)) {
        return Some(SourceKind::Script);
    }
    if path.starts_with(&paths.scss_dir) {
        return Some(SourceKind::Stylesheet);
    }
    if path.starts_with(&paths.vendor_dir) {
        return Some(SourceKind::Vendor);
    }
    if path.starts_with(&paths.skin_dir) {
        return Some(SourceKind::Skin);
    }
    if path.starts_with(&paths.container_dir) {
        return Some(SourceKind::Container);
    }
    None
}

/// Classify a debounced batch into the distinct kinds it touches.
fn classify_events(
    events: Vec<notify_debouncer_mini::DebouncedEvent>,
    paths: &WatchPaths,
) -> BTreeSet<SourceKind> {
    events
        .into_iter()
        .filter(|e| {
            matches!(
                e.kind,
                DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
            )
        })
        .filter_map(|e| classify_path(&e.path, paths))
        .collect()
}

/// Handle to a running source watcher. Dropping it stops watching.
pub struct SourceWatcherHandle {
    pub events: mpsc::UnboundedReceiver<BTreeSet<SourceKind>>,
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl SourceWatcherHandle {
    /// Wait for the next batch of changed source kinds.
    pub async fn next_batch(&mut self) -> Option<BTreeSet<SourceKind>> {
        self.events.recv().await
    }
}

/// Start watching every existing source root.
pub fn start_source_watcher(
    paths: WatchPaths,
    config: &WatcherConfig,
) -> Result<SourceWatcherHandle, notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();
    let classify_paths = paths.clone();

    let mut debouncer = new_debouncer(
        config.debounce_duration,
        move |result: notify_debouncer_mini::DebounceEventResult| match result {
            Ok(events) => {
                let kinds = classify_events(events, &classify_paths);
                if !kinds.is_empty() {
                    debug!(?kinds, "Source change detected");
                    let _ = tx.send(kinds);
                }
            }
            Err(e) => error!("File watcher error: {}", e),
        },
    )?;

    let watcher = debouncer.watcher();
    for root in paths.roots() {
        if root.exists() {
            info!("Watching {}", root.display());
            watcher.watch(root, notify::RecursiveMode::Recursive)?;
        } else {
            warn!("Directory does not exist, skipping watch: {}", root.display());
        }
    }

    Ok(SourceWatcherHandle {
        events: rx,
        _debouncer: debouncer,
    })
}

/// Run the steps for `kind` on the blocking pool, logging instead of failing.
async fn run_sequence(pipeline: Pipeline, kind: SourceKind, guard: Option<Arc<Mutex<()>>>) {
    let _lock = match &guard {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };

    info!(source = %kind, "Change detected, rebuilding");
    let steps = kind.steps();
    let result = tokio::task::spawn_blocking(move || pipeline.run(&steps)).await;
    match result {
        Ok(Ok(report)) => info!(
            source = %kind,
            issues = report.issues().count(),
            "Rebuild and distribute complete"
        ),
        Ok(Err(e)) => error!(source = %kind, error = %format!("{:#}", e), "Rebuild failed"),
        Err(e) => error!(source = %kind, error = %e, "Rebuild task panicked"),
    }
}

/// Watch sources and re-run the matching sequence on every change until Ctrl-C.
pub async fn run_watch(pipeline: Pipeline, config: WatcherConfig) -> Result<()> {
    let paths = WatchPaths::for_pipeline(&pipeline);
    let mut handle = start_source_watcher(paths, &config)?;
    let guard = config.serialize.then(|| Arc::new(Mutex::new(())));

    info!(
        debounce_ms = config.debounce_duration.as_millis() as u64,
        serialize = config.serialize,
        "Watching for changes, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            batch = handle.next_batch() => {
                let Some(kinds) = batch else {
                    info!("Source watcher channel closed, stopping");
                    break;
                };
                for kind in kinds {
                    tokio::spawn(run_sequence(pipeline.clone(), kind, guard.clone()));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    Ok(())
}
