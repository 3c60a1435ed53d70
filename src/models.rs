//! Report data models
//!
//! These are the serialized outputs of one analysis run.

use crate::graph::{CircularPair, DistanceSummary, LayerMap, ModuleNode, Orphan};
use crate::scoring::{PriorityRecord, ScoringFormula, SignalAvailability};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A non-fatal, per-file problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: String,
    pub message: String,
}

impl Warning {
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

/// How often an import alias is declared across the codebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasUsage {
    pub alias: String,
    /// Dotted target the alias stands for
    pub module: String,
    pub usage_count: usize,
    pub files: Vec<String>,
}

/// Headline counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub modules: usize,
    pub edges: usize,
    pub circular: usize,
    pub orphans: usize,
    /// Distinct external top-level names
    pub external_deps: usize,
    pub functions: usize,
    pub warnings: usize,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub root: String,
    pub root_package: Option<String>,
    pub summary: Summary,
    /// module id -> {file, imports, imported_by}
    pub graph: BTreeMap<String, ModuleNode>,
    pub layers: LayerMap,
    pub circular: Vec<CircularPair>,
    /// importer -> unresolved top-level names
    pub external_deps: BTreeMap<String, BTreeSet<String>>,
    pub aliases: Vec<AliasUsage>,
    /// alias -> target for aliases shared by two or more files
    pub alias_patterns: BTreeMap<String, String>,
    pub orphans: Vec<Orphan>,
    pub distances: DistanceSummary,
    pub formula: ScoringFormula,
    pub signals: SignalAvailability,
    pub priorities: Vec<PriorityRecord>,
    pub warnings: Vec<Warning>,
    pub notes: Vec<String>,
}
