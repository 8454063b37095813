//! Filesystem primitives shared by the pipeline steps.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Characters that make a path component a glob rather than a literal.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Remove a file or directory tree. A missing path is not an error.
///
/// Returns whether anything was removed.
pub fn remove_tree(path: &Path) -> io::Result<bool> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy every file under `src` into `dest`, preserving relative structure.
///
/// Existing files are overwritten; files already in `dest` but absent from `src`
/// are left in place. Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} is outside {}", entry.path().display(), src.display()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy one file, creating parent directories as needed.
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::copy(src, dest)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;
    Ok(())
}

/// Write `content` to `dest`, creating parent directories as needed.
pub fn write_file(dest: &Path, content: &str) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(dest, content).with_context(|| format!("failed to write {}", dest.display()))
}

/// The literal directory prefix of a glob pattern.
///
/// `dist/**/*.js` has base `dist`; a pattern without wildcards has its parent
/// directory as base, so `dist/jquery.min.js` also has base `dist`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let take = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };

    let joined = components[..take].join("/");
    if joined.is_empty() && pattern.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::from(joined)
    }
}

/// A file matched by a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatch {
    pub path: PathBuf,
    /// Path relative to the pattern's literal base.
    pub relative: PathBuf,
}

/// Expand `patterns` relative to `root` into matching files.
///
/// Order follows the patterns, then the matcher's alphabetical order within each
/// pattern. A file matched by several patterns appears once, at its first match.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<GlobMatch>> {
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for pattern in patterns {
        let (full, base) = if Path::new(pattern).is_absolute() {
            (pattern.clone(), glob_base(pattern))
        } else {
            let escaped = glob::Pattern::escape(&root.to_string_lossy());
            (
                format!("{}/{}", escaped.trim_end_matches('/'), pattern),
                root.join(glob_base(pattern)),
            )
        };

        let paths =
            glob::glob(&full).with_context(|| format!("invalid glob pattern '{}'", pattern))?;

        let before = matches.len();
        for path in paths {
            let path = path.with_context(|| format!("failed to expand '{}'", pattern))?;
            if !path.is_file() || !seen.insert(path.clone()) {
                continue;
            }
            let relative = path
                .strip_prefix(&base)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default());
            matches.push(GlobMatch { path, relative });
        }
        debug!(pattern = %pattern, matched = matches.len() - before, "Expanded glob");
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_glob_base() {
        assert_eq!(glob_base("dist/**/*.js"), PathBuf::from("dist"));
        assert_eq!(glob_base("dist/jquery.min.js"), PathBuf::from("dist"));
        assert_eq!(glob_base("*.css"), PathBuf::from(""));
        assert_eq!(glob_base("src/js/[ab].js"), PathBuf::from("src/js"));
        assert_eq!(glob_base("/abs/**/*.js"), PathBuf::from("/abs"));
        assert_eq!(glob_base("file.js"), PathBuf::from(""));
    }

    #[test]
    fn test_remove_tree_missing_is_ok() {
        let temp = TempDir::new().unwrap();
        assert!(!remove_tree(&temp.path().join("nope")).unwrap());
    }

    #[test]
    fn test_remove_tree_removes_dirs_and_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("tree");
        touch(&dir.join("a/b.txt"), "b");
        let file = temp.path().join("single.txt");
        touch(&file, "x");

        assert!(remove_tree(&dir).unwrap());
        assert!(remove_tree(&file).unwrap());
        assert!(!dir.exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_copy_tree_preserves_structure() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        touch(&src.join("logo.png"), "png");
        touch(&src.join("partials/header.ascx"), "<div/>");
        std::fs::create_dir_all(src.join("empty")).unwrap();

        let dest = temp.path().join("dest");
        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(std::fs::read_to_string(dest.join("logo.png")).unwrap(), "png");
        assert_eq!(
            std::fs::read_to_string(dest.join("partials/header.ascx")).unwrap(),
            "<div/>"
        );
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn test_expand_patterns_orders_and_dedupes() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("js/b.js"), "b");
        touch(&temp.path().join("js/a.js"), "a");
        touch(&temp.path().join("js/lib/c.js"), "c");

        let patterns = vec!["js/lib/*.js".to_string(), "js/**/*.js".to_string()];
        let matches = expand_patterns(temp.path(), &patterns).unwrap();
        let names: Vec<_> = matches
            .iter()
            .map(|m| m.relative.to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(names, vec!["c.js", "a.js", "b.js"]);
    }

    #[test]
    fn test_expand_literal_pattern_relative_to_parent() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("dist/jquery.min.js"), "jq");

        let matches =
            expand_patterns(temp.path(), &["dist/jquery.min.js".to_string()]).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].relative, PathBuf::from("jquery.min.js"));
    }

    #[test]
    fn test_expand_no_matches_is_empty() {
        let temp = TempDir::new().unwrap();
        let matches = expand_patterns(temp.path(), &["src/js/**/*.js".to_string()]).unwrap();
        assert!(matches.is_empty());
    }
}
