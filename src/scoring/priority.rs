//! Per-file priority scorer

use super::{normalize_values, SignalAvailability};
use crate::config::ScoringConfig;
use crate::graph::DependencyGraph;
use crate::signals::{GitRiskRecord, PathMatcher, SignalInputs, NEUTRAL_FRESHNESS};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Raw and normalized inputs behind one score
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreComponents {
    /// Summed function complexity, if known
    pub complexity: Option<u32>,
    pub complexity_norm: f64,
    pub imported_by: usize,
    pub imports_norm: f64,
    pub risk: f64,
    pub churn: u32,
    pub hotfixes: u32,
    pub freshness: f64,
    pub untested: f64,
}

/// One ranked file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRecord {
    pub file: String,
    pub module: String,
    /// Composite score in [0, 1], rounded to 3 decimals
    pub score: f64,
    pub components: ScoreComponents,
    pub reasons: Vec<String>,
}

/// Combines graph structure and optional signals into a ranked file list
pub struct PriorityScorer<'a> {
    graph: &'a DependencyGraph,
    signals: &'a SignalInputs,
    config: &'a ScoringConfig,
    root_package: Option<&'a str>,
}

impl<'a> PriorityScorer<'a> {
    pub fn new(
        graph: &'a DependencyGraph,
        signals: &'a SignalInputs,
        config: &'a ScoringConfig,
    ) -> Self {
        Self {
            graph,
            signals,
            config,
            root_package: None,
        }
    }

    /// Root package used as an anchor when matching signal paths
    pub fn with_root_package(mut self, root_package: Option<&'a str>) -> Self {
        self.root_package = root_package;
        self
    }

    pub fn availability(&self) -> SignalAvailability {
        SignalAvailability::from_inputs(self.signals)
    }

    /// Score every module's file and return the ranked list
    pub fn calculate(&self) -> Vec<PriorityRecord> {
        let modules: Vec<(&String, PathBuf, usize)> = self
            .graph
            .modules()
            .iter()
            .map(|(id, node)| (id, node.file.clone(), node.imported_by.len()))
            .collect();
        if modules.is_empty() {
            return Vec::new();
        }

        let files: Vec<PathBuf> = modules.iter().map(|(_, f, _)| f.clone()).collect();
        let matcher = PathMatcher::new(&files, self.root_package);
        let matched = |path: &str| matcher.find(path).map(|p| p.to_path_buf());

        let mut complexity: HashMap<PathBuf, u32> = HashMap::new();
        for (path, cc) in self.signals.complexity.iter().flatten() {
            if let Some(file) = matched(path.as_str()) {
                complexity.entry(file).or_insert(*cc);
            }
        }

        let mut risk: HashMap<PathBuf, &GitRiskRecord> = HashMap::new();
        for record in self.signals.git_risk.iter().flatten() {
            if let Some(file) = matched(record.file.as_str()) {
                risk.entry(file).or_insert(record);
            }
        }

        let mut freshness: HashMap<PathBuf, f64> = HashMap::new();
        if let Some(buckets) = &self.signals.freshness {
            for (bucket, entry) in buckets.entries() {
                if let Some(file) = matched(entry.file.as_str()) {
                    freshness.entry(file).or_insert(bucket.weight());
                }
            }
        }

        let mut coverage: HashMap<PathBuf, bool> = HashMap::new();
        for (path, tested) in self.signals.coverage.iter().flatten() {
            if let Some(file) = matched(path.as_str()) {
                coverage.entry(file).or_insert(*tested);
            }
        }

        debug!(
            "Matched signals: complexity={}, risk={}, freshness={}, coverage={}",
            complexity.len(),
            risk.len(),
            freshness.len(),
            coverage.len()
        );

        // Complexity is normalized over files that have data only
        let with_cc: Vec<&PathBuf> = files.iter().filter(|f| complexity.contains_key(*f)).collect();
        let cc_values: Vec<f64> = with_cc.iter().map(|f| complexity[*f] as f64).collect();
        let cc_norm: HashMap<&PathBuf, f64> = with_cc
            .into_iter()
            .zip(normalize_values(&cc_values))
            .collect();

        let import_values: Vec<f64> = modules.iter().map(|(_, _, n)| *n as f64).collect();
        let import_norm = normalize_values(&import_values);

        let weights = self.availability().weights(self.config);

        let mut records: Vec<PriorityRecord> = modules
            .iter()
            .zip(import_norm)
            .map(|((id, file, imported_by), imports_norm)| {
                let git = risk.get(file);
                let components = ScoreComponents {
                    complexity: complexity.get(file).copied(),
                    complexity_norm: cc_norm.get(file).copied().unwrap_or(0.0),
                    imported_by: *imported_by,
                    imports_norm,
                    risk: git.map_or(0.0, |r| r.risk_score),
                    churn: git.map_or(0, |r| r.churn),
                    hotfixes: git.map_or(0, |r| r.hotfixes),
                    freshness: freshness.get(file).copied().unwrap_or(NEUTRAL_FRESHNESS),
                    untested: match coverage.get(file) {
                        Some(false) => 1.0,
                        Some(true) => 0.0,
                        None => 0.5,
                    },
                };

                let score = weights.complexity * components.complexity_norm
                    + weights.imports * components.imports_norm
                    + weights.risk * components.risk
                    + weights.freshness * components.freshness
                    + weights.untested * components.untested;

                PriorityRecord {
                    file: file.to_string_lossy().into_owned(),
                    module: (*id).clone(),
                    score: (score * 1000.0).round() / 1000.0,
                    reasons: reasons(&components, coverage.get(file).copied()),
                    components,
                }
            })
            .collect();

        sort_records(&mut records);
        self.truncate_with_risk(records)
    }

    /// Keep the top N, then pull in high-risk files that fell below the cut
    fn truncate_with_risk(&self, mut records: Vec<PriorityRecord>) -> Vec<PriorityRecord> {
        if records.len() <= self.config.top_n {
            return records;
        }

        let rest = records.split_off(self.config.top_n);
        let injected: Vec<PriorityRecord> = rest
            .into_iter()
            .filter(|r| r.components.risk > self.config.risk_threshold)
            .take(self.config.max_risk_injections)
            .collect();

        if !injected.is_empty() {
            debug!("Re-injected {} high-risk files below the top {}", injected.len(), self.config.top_n);
        }

        records.extend(injected);
        sort_records(&mut records);
        records
    }

    /// Human-readable account of how the ranking was produced
    pub fn explain(&self, records: &[PriorityRecord]) -> String {
        let availability = self.availability();
        let w = availability.weights(self.config);
        let mut lines = Vec::new();

        lines.push(format!("Formula: {}", availability.formula()));
        lines.push(format!(
            "  score = {:.2}·CC + {:.2}·Import + {:.2}·Risk + {:.2}·Freshness + {:.2}·Untested",
            w.complexity, w.imports, w.risk, w.freshness, w.untested
        ));
        for note in availability.notes() {
            lines.push(format!("  note: {}", note));
        }

        lines.push(String::new());
        for (rank, record) in records.iter().enumerate() {
            let c = &record.components;
            lines.push(format!(
                "{:>3}. {:.3}  {}  [{}]",
                rank + 1,
                record.score,
                record.file,
                record.reasons.join(", ")
            ));
            lines.push(format!(
                "       cc={:.2} import={:.2} risk={:.2} fresh={:.2} untested={:.2}",
                c.complexity_norm, c.imports_norm, c.risk, c.freshness, c.untested
            ));
        }

        lines.join("\n")
    }
}

fn sort_records(records: &mut [PriorityRecord]) {
    records.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.file.cmp(&b.file)));
}

fn reasons(c: &ScoreComponents, tested: Option<bool>) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(cc) = c.complexity.filter(|cc| *cc > 10) {
        reasons.push(format!("CC:{}", cc));
    }
    if c.risk > 0.5 {
        reasons.push(format!("risk:{:.2}", c.risk));
    }
    if c.churn > 5 {
        reasons.push(format!("churn:{}", c.churn));
    }
    if c.hotfixes > 3 {
        reasons.push(format!("hotfix:{}", c.hotfixes));
    }
    if c.imported_by > 10 {
        reasons.push(format!("imported by {}", c.imported_by));
    }
    if tested == Some(false) {
        reasons.push("untested".to_string());
    }
    if reasons.is_empty() {
        reasons.push("low signal".to_string());
    }
    reasons
}
