//! Stylesheet compiler and script minifier seams.
//!
//! The pipeline never compiles or minifies anything itself. It calls through these
//! traits, so tests and embedders can swap the implementations.

use std::path::Path;
use std::sync::Arc;

/// Compiles one stylesheet entry file into minified CSS.
pub trait StylesheetCompiler: Send + Sync {
    /// `load_dir` is searched for imported partials.
    fn compile(&self, entry: &Path, load_dir: &Path) -> Result<String, String>;
}

/// Minifies a bundled script.
pub trait ScriptMinifier: Send + Sync {
    /// Fails when `source` does not parse.
    fn minify(&self, source: &str) -> Result<String, String>;
}

/// SCSS compiler producing compressed output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassCompiler;

impl StylesheetCompiler for GrassCompiler {
    fn compile(&self, entry: &Path, load_dir: &Path) -> Result<String, String> {
        let options = grass::Options::default()
            .style(grass::OutputStyle::Compressed)
            .load_path(load_dir);
        grass::from_path(entry, &options).map_err(|e| e.to_string())
    }
}

/// Parsing JavaScript minifier. Top-level names are kept: the bundle runs in the
/// page's global scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinifier;

impl ScriptMinifier for JsMinifier {
    fn minify(&self, source: &str) -> Result<String, String> {
        let session = minify_js::Session::new();
        let mut out = Vec::with_capacity(source.len());
        minify_js::minify(
            &session,
            minify_js::TopLevelMode::Global,
            source.as_bytes(),
            &mut out,
        )
        .map_err(|e| format!("{:?}", e))?;
        String::from_utf8(out).map_err(|e| e.to_string())
    }
}

/// The external capabilities a pipeline calls into.
#[derive(Clone)]
pub struct Toolchain {
    pub stylesheet: Arc<dyn StylesheetCompiler>,
    pub script: Arc<dyn ScriptMinifier>,
}

impl Toolchain {
    pub fn new(stylesheet: Arc<dyn StylesheetCompiler>, script: Arc<dyn ScriptMinifier>) -> Self {
        Self { stylesheet, script }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(Arc::new(GrassCompiler), Arc::new(JsMinifier))
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
