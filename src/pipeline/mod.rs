//! Analysis pipeline
//!
//! Orchestrates one run:
//! 1. Walk source files
//! 2. Parse imports, main guards and complexity (parallel)
//! 3. Register modules and resolve references into the dependency graph
//! 4. Run the structural analyses (cycles, layers, distances, orphans)
//! 5. Collect optional signals (git history, coverage) and rank files

pub mod aliases;
pub mod extract;

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::XrayConfig;
use crate::discovery::collect_source_files;
use crate::error::{XrayError, XrayResult};
use crate::git::{GitHistory, GitSignals};
use crate::graph::{
    analyze_distances, classify_layers, detect_root_package, find_circular_pairs, find_orphans,
    DependencyGraph, ModuleRegistry, ReferenceResolver,
};
use crate::models::{AnalysisReport, Summary, Warning};
use crate::parsers::ParsedFile;
use crate::scoring::PriorityScorer;
use crate::signals::coverage::coverage_from_files;
use crate::signals::SignalInputs;

use aliases::{aggregate_aliases, ALIAS_LIMIT};
use extract::{default_workers, extract_all, Extraction};

/// Full analysis pipeline.
pub struct Pipeline {
    config: XrayConfig,
    /// Whether to mine git history for risk and freshness
    enable_git: bool,
}

impl Pipeline {
    /// Create a pipeline from a loaded project config.
    pub fn new(config: XrayConfig) -> Self {
        let enable_git = config.git.enabled;
        Self { config, enable_git }
    }

    /// Disable git signals.
    pub fn without_git(mut self) -> Self {
        self.enable_git = false;
        self
    }

    /// Use an explicit root package instead of auto-detection.
    pub fn with_root_package(mut self, root_package: impl Into<String>) -> Self {
        self.config.analysis.root_package = Some(root_package.into());
        self
    }

    /// Derive module ids relative to `source_root` (relative to the target).
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.config.analysis.source_root = Some(source_root.into());
        self
    }

    /// Set the extraction worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.analysis.workers = Some(workers);
        self
    }

    pub fn config(&self) -> &XrayConfig {
        &self.config
    }

    /// Discover files under `target`, collect every available signal and
    /// analyze.
    pub fn run(&self, target: &Path) -> XrayResult<AnalysisReport> {
        if !target.is_dir() || std::fs::read_dir(target).is_err() {
            return Err(XrayError::InvalidTarget {
                path: target.to_path_buf(),
            });
        }

        let files = collect_source_files(
            target,
            &self.config.analysis.extensions,
            &self.config.exclude.paths,
        );
        if files.is_empty() {
            return Err(XrayError::NoSourceFiles {
                path: target.to_path_buf(),
            });
        }
        info!("Analyzing {} source files under {}", files.len(), target.display());

        let extraction = self.extract(target, &files)?;
        let mut notes = Vec::new();

        // Files that failed to parse only surface as warnings
        let analyzed = &extraction.files;
        let complexity: BTreeMap<String, u32> = analyzed
            .iter()
            .zip(&extraction.parsed)
            .map(|(f, p)| (f.to_string_lossy().into_owned(), p.total_complexity()))
            .collect();

        let mut signals = SignalInputs {
            complexity: Some(complexity),
            coverage: coverage_from_files(analyzed),
            ..Default::default()
        };

        if self.enable_git {
            match self.git_signals(target, analyzed) {
                Ok(Some(git)) => {
                    debug!("Git signals from {} commits", git.commits_scanned);
                    signals.git_risk = Some(git.risk);
                    signals.freshness = Some(git.freshness);
                }
                Ok(None) => notes.push("not a git repository; git signals skipped".to_string()),
                Err(e) => {
                    debug!("Git history failed: {:#}", e);
                    notes.push(format!("git history unavailable: {}", e));
                }
            }
        } else {
            notes.push("git signals disabled".to_string());
        }

        Ok(self.assemble(target, files.len(), extraction, signals, notes))
    }

    /// Analyze an explicit file list (paths relative to `root`) with
    /// caller-supplied signals.
    pub fn analyze_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        signals: SignalInputs,
    ) -> XrayResult<AnalysisReport> {
        if files.is_empty() {
            return Err(XrayError::NoSourceFiles {
                path: root.to_path_buf(),
            });
        }

        let extraction = self.extract(root, files)?;
        Ok(self.assemble(root, files.len(), extraction, signals, Vec::new()))
    }

    fn extract(&self, root: &Path, files: &[PathBuf]) -> XrayResult<Extraction> {
        let workers = self.config.analysis.workers.unwrap_or_else(default_workers);
        extract_all(root, files, workers)
    }

    fn git_signals(&self, target: &Path, files: &[PathBuf]) -> anyhow::Result<Option<GitSignals>> {
        if !GitHistory::is_git_repo(target) {
            return Ok(None);
        }
        let history = GitHistory::open(target)?;
        history
            .signals(target, files, &self.config.git, Utc::now())
            .map(Some)
    }

    fn source_root(&self, root: &Path) -> PathBuf {
        match &self.config.analysis.source_root {
            Some(dir) => dir.strip_prefix(root).unwrap_or(dir).to_path_buf(),
            None => PathBuf::new(),
        }
    }

    fn assemble(
        &self,
        root: &Path,
        discovered: usize,
        extraction: Extraction,
        signals: SignalInputs,
        mut notes: Vec<String>,
    ) -> AnalysisReport {
        let Extraction {
            files,
            parsed,
            mut warnings,
        } = extraction;
        let config = &self.config;
        let source_root = self.source_root(root);

        let root_package = match &config.analysis.root_package {
            Some(pkg) => Some(pkg.clone()),
            None if config.analysis.auto_detect_root => {
                detect_root_package(&files, &source_root, parsed.iter().map(|p| &p.imports))
            }
            None => None,
        };
        if let Some(pkg) = &root_package {
            debug!("Root package: {}", pkg);
        }

        let registry =
            ModuleRegistry::build(&files, &source_root, root_package.as_deref(), &mut warnings);
        let resolver = ReferenceResolver::new(&registry, &config.resolver);

        let by_id: Vec<(&str, &ParsedFile)> = files
            .iter()
            .zip(&parsed)
            .filter_map(|(file, p)| registry.id_of(file).map(|id| (id, p)))
            .collect();

        let graph = DependencyGraph::build(
            &registry,
            &resolver,
            by_id.iter().map(|(id, p)| (*id, &p.imports)),
        );

        let circular = find_circular_pairs(graph.edges());
        let layers = classify_layers(&graph, &config.layers);

        let distances = analyze_distances(&graph, config.analysis.max_distance_nodes);
        if distances.skipped {
            notes.push(format!(
                "distance analysis skipped: {} modules exceeds the limit of {}",
                graph.len(),
                config.analysis.max_distance_nodes
            ));
        }

        let guarded: HashSet<&str> = by_id
            .iter()
            .filter(|(_, p)| p.has_main_guard)
            .map(|(id, _)| *id)
            .collect();
        let orphans = find_orphans(&graph, &config.orphans, |id| guarded.contains(id));

        let aliases = aggregate_aliases(
            files.iter().map(PathBuf::as_path).zip(parsed.iter().map(|p| &p.imports)),
            ALIAS_LIMIT,
        );
        let external_names: BTreeSet<&String> = graph.external().values().flatten().collect();

        let scorer = PriorityScorer::new(&graph, &signals, &config.scoring)
            .with_root_package(root_package.as_deref());
        let availability = scorer.availability();
        notes.extend(availability.notes());
        let priorities = scorer.calculate();

        let summary = Summary {
            files: discovered,
            modules: graph.len(),
            edges: graph.edge_count(),
            circular: circular.len(),
            orphans: orphans.len(),
            external_deps: external_names.len(),
            functions: parsed.iter().map(|p| p.functions.len()).sum(),
            warnings: warnings.len(),
        };

        info!(
            "Analysis complete: {} modules, {} edges, {} cycles, {} orphans",
            summary.modules, summary.edges, summary.circular, summary.orphans
        );

        AnalysisReport {
            root: root.display().to_string(),
            root_package,
            summary,
            graph: graph.modules().clone(),
            layers,
            circular,
            external_deps: graph.external().clone(),
            aliases: aliases.top,
            alias_patterns: aliases.patterns,
            orphans,
            distances,
            formula: availability.formula(),
            signals: availability,
            priorities,
            warnings: sorted_warnings(warnings),
            notes,
        }
    }
}

fn sorted_warnings(mut warnings: Vec<Warning>) -> Vec<Warning> {
    warnings.sort_by(|a, b| a.path.cmp(&b.path));
    warnings
}
