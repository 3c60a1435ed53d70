//! Architectural layer classification
//!
//! Naming keywords are checked before graph shape. The import ratio
//! `imported_by / (imports + 1)` is the fallback for modules whose names say
//! nothing about their role.

use crate::config::LayerRules;
use crate::graph::builder::DependencyGraph;
use serde::Serialize;

/// Coarse architectural role of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Foundation,
    Core,
    Orchestration,
    Leaf,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Foundation => write!(f, "foundation"),
            Layer::Core => write!(f, "core"),
            Layer::Orchestration => write!(f, "orchestration"),
            Layer::Leaf => write!(f, "leaf"),
        }
    }
}

/// Modules grouped by layer, each list sorted by importer count (desc)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerMap {
    pub foundation: Vec<String>,
    pub core: Vec<String>,
    pub orchestration: Vec<String>,
    pub leaf: Vec<String>,
}

impl LayerMap {
    pub fn get(&self, layer: Layer) -> &[String] {
        match layer {
            Layer::Foundation => &self.foundation,
            Layer::Core => &self.core,
            Layer::Orchestration => &self.orchestration,
            Layer::Leaf => &self.leaf,
        }
    }

    fn get_mut(&mut self, layer: Layer) -> &mut Vec<String> {
        match layer {
            Layer::Foundation => &mut self.foundation,
            Layer::Core => &mut self.core,
            Layer::Orchestration => &mut self.orchestration,
            Layer::Leaf => &mut self.leaf,
        }
    }

    /// Layer assigned to `id`, if classified
    pub fn layer_of(&self, id: &str) -> Option<Layer> {
        [Layer::Foundation, Layer::Core, Layer::Orchestration, Layer::Leaf]
            .into_iter()
            .find(|layer| self.get(*layer).iter().any(|m| m == id))
    }
}

/// Classify a single module. First matching rule wins.
pub fn classify(id: &str, imports: usize, imported_by: usize, rules: &LayerRules) -> Layer {
    let lower = id.to_lowercase();
    let has_keyword = |keywords: &[String]| {
        keywords
            .iter()
            .any(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()))
    };

    if has_keyword(&rules.orchestration_keywords) {
        return Layer::Orchestration;
    }
    if has_keyword(&rules.foundation_keywords) {
        return Layer::Foundation;
    }
    if imports == 0 && imported_by == 0 {
        return Layer::Leaf;
    }

    let ratio = imported_by as f64 / (imports as f64 + 1.0);
    if ratio > rules.foundation_ratio {
        Layer::Foundation
    } else if ratio < rules.orchestration_ratio && imports > rules.orchestration_min_imports {
        Layer::Orchestration
    } else {
        Layer::Core
    }
}

/// Assign every module in the graph to exactly one layer
pub fn classify_layers(graph: &DependencyGraph, rules: &LayerRules) -> LayerMap {
    let mut map = LayerMap::default();

    for (id, node) in graph.modules() {
        let layer = classify(id, node.imports.len(), node.imported_by.len(), rules);
        map.get_mut(layer).push(id.clone());
    }

    let importers = |id: &String| graph.get(id).map(|n| n.imported_by.len()).unwrap_or(0);
    for layer in [Layer::Foundation, Layer::Core, Layer::Orchestration, Layer::Leaf] {
        map.get_mut(layer)
            .sort_by(|a, b| importers(b).cmp(&importers(a)).then_with(|| a.cmp(b)));
    }

    map
}
