//! Source file discovery
//!
//! Walks the analysis root honoring `.gitignore` (even outside a git
//! checkout) and a project-local `.xrayignore`, then applies the extension
//! filter and the `[exclude]` glob patterns from the project config.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project-local ignore file, gitignore syntax
pub const IGNORE_FILE: &str = ".xrayignore";

/// Directory names never descended into
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
    "node_modules",
    "build",
    "dist",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".eggs",
    "site-packages",
    ".git",
];

/// Compile exclude patterns. Invalid patterns are skipped with a warning.
pub fn build_exclude_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e),
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build exclude set: {}", e);
        GlobSet::empty()
    })
}

/// Collect source files under `root`, as sorted paths relative to `root`.
pub fn collect_source_files(root: &Path, extensions: &[String], exclude: &[String]) -> Vec<PathBuf> {
    let excluded = build_exclude_set(exclude);

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| DEFAULT_IGNORED_DIRS.contains(&name)))
        });

    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in builder.build().flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !extensions.iter().any(|e| e == ext) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        if excluded.is_match(&relative) {
            skipped += 1;
            continue;
        }
        files.push(relative);
    }

    files.sort();
    debug!(
        "Discovered {} source files under {} ({} excluded by pattern)",
        files.len(),
        root.display(),
        skipped
    );
    files
}
