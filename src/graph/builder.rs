//! Dependency graph assembly
//!
//! Turns resolved references into importer -> imported edges with reverse
//! links. Insertion is idempotent and order-independent: forward and reverse
//! sets are ordered, so the final graph is the same for any file order.

use crate::graph::registry::ModuleRegistry;
use crate::graph::resolver::{ReferenceResolver, Resolution};
use crate::parsers::ImportRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

/// One module in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleNode {
    pub file: PathBuf,
    /// Modules this module imports
    pub imports: BTreeSet<String>,
    /// Modules that import this module
    pub imported_by: BTreeSet<String>,
}

impl ModuleNode {
    fn new(file: PathBuf) -> Self {
        Self {
            file,
            imports: BTreeSet::new(),
            imported_by: BTreeSet::new(),
        }
    }

    /// Total degree (imports + importers)
    pub fn degree(&self) -> usize {
        self.imports.len() + self.imported_by.len()
    }
}

/// Module dependency graph for one analysis run
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    modules: BTreeMap<String, ModuleNode>,
    /// Edges in insertion order
    edges: Vec<(String, String)>,
    edge_set: HashSet<(String, String)>,
    /// importer -> unresolved top-level names
    external: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Empty graph holding one node per registered module
    pub fn from_registry(registry: &ModuleRegistry) -> Self {
        let modules = registry
            .iter()
            .map(|(id, file)| (id.to_string(), ModuleNode::new(file.to_path_buf())))
            .collect();

        Self {
            modules,
            ..Default::default()
        }
    }

    /// Resolve every importer's references and insert the resulting edges.
    ///
    /// `records` pairs a module id with the imports extracted from its file.
    pub fn build<'r>(
        registry: &ModuleRegistry,
        resolver: &ReferenceResolver<'_>,
        records: impl IntoIterator<Item = (&'r str, &'r ImportRecord)>,
    ) -> Self {
        let mut graph = Self::from_registry(registry);
        let mut dropped_relative = 0usize;

        for (importer, record) in records {
            for reference in &record.absolute {
                match resolver.resolve_absolute(importer, reference) {
                    Resolution::Internal(target) => {
                        graph.add_edge(importer, &target);
                    }
                    Resolution::External(name) => graph.add_external(importer, &name),
                    Resolution::Known | Resolution::Unresolved => {}
                }
            }

            for reference in &record.relative {
                match resolver.resolve_relative(importer, reference) {
                    Resolution::Internal(target) => {
                        graph.add_edge(importer, &target);
                    }
                    _ => {
                        debug!("{}: dropping unresolved relative import '{}'", importer, reference);
                        dropped_relative += 1;
                    }
                }
            }
        }

        info!(
            "Built dependency graph: {} modules, {} edges, {} with external deps",
            graph.modules.len(),
            graph.edges.len(),
            graph.external.len()
        );
        if dropped_relative > 0 {
            debug!("Dropped {} unresolved relative imports", dropped_relative);
        }

        graph
    }

    /// Insert an edge. Returns false for self-edges, duplicates, and edges
    /// whose ends are not both known modules.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        if from == to || !self.modules.contains_key(from) || !self.modules.contains_key(to) {
            return false;
        }

        let key = (from.to_string(), to.to_string());
        if !self.edge_set.insert(key.clone()) {
            return false;
        }

        if let Some(node) = self.modules.get_mut(from) {
            node.imports.insert(to.to_string());
        }
        if let Some(node) = self.modules.get_mut(to) {
            node.imported_by.insert(from.to_string());
        }
        self.edges.push(key);
        true
    }

    /// Record an unresolved top-level name for `importer`
    pub fn add_external(&mut self, importer: &str, name: &str) {
        self.external
            .entry(importer.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn get(&self, id: &str) -> Option<&ModuleNode> {
        self.modules.get(id)
    }

    /// Modules in id order
    pub fn modules(&self) -> &BTreeMap<String, ModuleNode> {
        &self.modules
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn external(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.external
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
