//! Naming-based test coverage indicator
//!
//! A source file counts as tested when a test file named after it exists
//! anywhere in the file set (`test_<stem>.py` or `<stem>_test.py`). This is a
//! presence check, not line coverage.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stem of the module a test file covers, if `file` is a test file
pub fn tested_stem(file: &Path) -> Option<String> {
    let stem = file.file_stem()?.to_str()?;
    if let Some(rest) = stem.strip_prefix("test_") {
        return (!rest.is_empty()).then(|| rest.to_string());
    }
    stem.strip_suffix("_test")
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// file -> tested, for every non-test file.
///
/// Returns `None` when the file set contains no test files at all, so that
/// "no tests found" is reported as missing data rather than "all untested".
pub fn coverage_from_files(files: &[PathBuf]) -> Option<BTreeMap<String, bool>> {
    let tested: HashSet<String> = files.iter().filter_map(|f| tested_stem(f)).collect();
    if tested.is_empty() {
        debug!("No test files found, coverage signal unavailable");
        return None;
    }

    let coverage: BTreeMap<String, bool> = files
        .iter()
        .filter(|f| tested_stem(f).is_none())
        .filter_map(|f| {
            let stem = f.file_stem()?.to_str()?;
            if stem == "__init__" || stem == "conftest" {
                return None;
            }
            Some((f.to_string_lossy().into_owned(), tested.contains(stem)))
        })
        .collect();

    debug!(
        "Coverage indicator: {}/{} files have tests",
        coverage.values().filter(|t| **t).count(),
        coverage.len()
    );
    Some(coverage)
}
