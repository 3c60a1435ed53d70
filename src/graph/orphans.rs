//! Orphan module detection
//!
//! An orphan is a module nobody imports that is not a deliberate entry point.
//! Confidence is a heuristic taken from the file path, not a probability.

use crate::config::OrphanRules;
use crate::graph::builder::DependencyGraph;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A module with no importers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Orphan {
    pub file: PathBuf,
    pub module: String,
    pub confidence: f64,
    pub reason: String,
}

fn file_name_lower(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Entry point by file name: configured names and test-file conventions
pub fn is_entry_point_name(file: &Path, rules: &OrphanRules) -> bool {
    let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    rules.entry_points.iter().any(|e| e == name)
        || rules.test_prefixes.iter().any(|p| name.starts_with(p.as_str()))
        || rules.test_suffixes.iter().any(|s| name.ends_with(s.as_str()))
}

/// Confidence and reason for an orphan at `file`
pub fn orphan_confidence(file: &Path, rules: &OrphanRules) -> (f64, String) {
    let path = file.to_string_lossy().to_lowercase();
    let name = file_name_lower(file);
    let matches = |text: &str, keywords: &[String]| {
        keywords
            .iter()
            .find(|kw| !kw.is_empty() && text.contains(kw.to_lowercase().as_str()))
            .cloned()
    };

    if let Some(kw) = matches(&path, &rules.script_keywords) {
        (
            rules.script_confidence,
            format!("no importers; path mentions '{}', likely an ad-hoc script", kw),
        )
    } else if let Some(kw) = matches(&name, &rules.deprecated_keywords) {
        (
            rules.deprecated_confidence,
            format!("no importers; name mentions '{}'", kw),
        )
    } else if let Some(kw) = matches(&name, &rules.utility_keywords) {
        (
            rules.utility_confidence,
            format!("no importers; name mentions '{}', may be used dynamically", kw),
        )
    } else {
        (rules.base_confidence, "no importers".to_string())
    }
}

/// Find orphans, sorted by confidence (desc) then path.
///
/// `has_main_guard` reports whether a module's source contains an
/// `if __name__ == "__main__"` guard, which marks it as an entry point.
pub fn find_orphans(
    graph: &DependencyGraph,
    rules: &OrphanRules,
    has_main_guard: impl Fn(&str) -> bool,
) -> Vec<Orphan> {
    let mut orphans: Vec<Orphan> = graph
        .modules()
        .iter()
        .filter(|(_, node)| node.imported_by.is_empty())
        .filter(|(id, node)| !is_entry_point_name(&node.file, rules) && !has_main_guard(id))
        .map(|(id, node)| {
            let (confidence, reason) = orphan_confidence(&node.file, rules);
            Orphan {
                file: node.file.clone(),
                module: id.clone(),
                confidence,
                reason,
            }
        })
        .collect();

    orphans.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.file.cmp(&b.file))
    });
    orphans
}
