//! Optional per-file signals consumed by the priority scorer
//!
//! Every signal source is optional. Collaborators may report paths in their
//! own representation (absolute, repo-relative, package-relative), so
//! [`PathMatcher`] maps them back onto the analyzed file set.

pub mod coverage;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Git maintenance risk for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitRiskRecord {
    pub file: String,
    /// Composite risk in [0, 1]
    pub risk_score: f64,
    pub churn: u32,
    pub hotfixes: u32,
    pub authors: u32,
}

/// Recency bucket of a file's last change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Active,
    Aging,
    Stale,
    Dormant,
}

impl Freshness {
    /// Weight used by the priority formula
    pub fn weight(self) -> f64 {
        match self {
            Freshness::Active => 1.0,
            Freshness::Aging => 0.7,
            Freshness::Stale => 0.4,
            Freshness::Dormant => 0.1,
        }
    }
}

/// Freshness weight for files with no bucket
pub const NEUTRAL_FRESHNESS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessEntry {
    pub file: String,
    /// Days since the last commit touching the file
    pub days: i64,
}

/// Files grouped by recency of their last change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessBuckets {
    pub active: Vec<FreshnessEntry>,
    pub aging: Vec<FreshnessEntry>,
    pub stale: Vec<FreshnessEntry>,
    pub dormant: Vec<FreshnessEntry>,
}

impl FreshnessBuckets {
    /// (bucket, entry) for every entry, most recent bucket first
    pub fn entries(&self) -> impl Iterator<Item = (Freshness, &FreshnessEntry)> {
        let active = self.active.iter().map(|e| (Freshness::Active, e));
        let aging = self.aging.iter().map(|e| (Freshness::Aging, e));
        let stale = self.stale.iter().map(|e| (Freshness::Stale, e));
        let dormant = self.dormant.iter().map(|e| (Freshness::Dormant, e));
        active.chain(aging).chain(stale).chain(dormant)
    }

    pub fn push(&mut self, bucket: Freshness, entry: FreshnessEntry) {
        match bucket {
            Freshness::Active => self.active.push(entry),
            Freshness::Aging => self.aging.push(entry),
            Freshness::Stale => self.stale.push(entry),
            Freshness::Dormant => self.dormant.push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.aging.len() + self.stale.len() + self.dormant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All optional signal inputs for one scoring run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalInputs {
    /// file -> summed function complexity
    pub complexity: Option<BTreeMap<String, u32>>,
    pub git_risk: Option<Vec<GitRiskRecord>>,
    pub freshness: Option<FreshnessBuckets>,
    /// file -> has tests
    pub coverage: Option<BTreeMap<String, bool>>,
}

/// Directory names that start the project-relative part of a path
const ANCHORS: &[&str] = &["src", "lib", "tests"];

fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Project-relative suffix of a path: from the first anchor segment (or the
/// root package) onward, else just the file name.
pub fn normalize_path(path: &str, root_package: Option<&str>) -> String {
    let parts = segments(path);
    let anchor = parts
        .iter()
        .position(|p| ANCHORS.contains(p) || Some(*p) == root_package);

    match anchor {
        Some(i) => parts[i..].join("/"),
        None => parts.last().map(|s| s.to_string()).unwrap_or_default(),
    }
}

/// Maps collaborator-reported paths onto analyzed files.
///
/// Lookup order: exact repo-relative path, then a reported path ending with
/// an analyzed path, then equal normalized suffixes. Ambiguous matches take
/// the first analyzed file in path order.
pub struct PathMatcher {
    exact: HashMap<String, PathBuf>,
    by_suffix: HashMap<String, PathBuf>,
    /// Analyzed paths (slash-joined), in path order
    ordered: Vec<(String, PathBuf)>,
    root_package: Option<String>,
}

impl PathMatcher {
    pub fn new(files: &[PathBuf], root_package: Option<&str>) -> Self {
        let mut sorted: Vec<&PathBuf> = files.iter().collect();
        sorted.sort();

        let mut exact = HashMap::new();
        let mut by_suffix = HashMap::new();
        let mut ordered = Vec::with_capacity(sorted.len());

        for file in sorted {
            let key = segments(&file.to_string_lossy()).join("/");
            exact.entry(key.clone()).or_insert_with(|| file.clone());
            by_suffix
                .entry(normalize_path(&key, root_package))
                .or_insert_with(|| file.clone());
            ordered.push((key, file.clone()));
        }

        Self {
            exact,
            by_suffix,
            ordered,
            root_package: root_package.map(str::to_string),
        }
    }

    /// Analyzed file the reported `path` refers to
    pub fn find(&self, path: &str) -> Option<&Path> {
        let key = segments(path).join("/");
        if let Some(file) = self.exact.get(&key) {
            return Some(file);
        }

        if let Some((_, file)) = self
            .ordered
            .iter()
            .find(|(analyzed, _)| key.ends_with(&format!("/{}", analyzed)))
        {
            return Some(file);
        }

        self.by_suffix
            .get(&normalize_path(&key, self.root_package.as_deref()))
            .map(PathBuf::as_path)
    }
}
