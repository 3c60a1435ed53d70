//! Module dependency graph
//!
//! Registry, resolution and graph assembly, plus the structural analyses that
//! run over the finished graph (cycles, layers, distances, orphans).

pub mod builder;
pub mod cycles;
pub mod distance;
pub mod layers;
pub mod orphans;
pub mod registry;
pub mod resolver;

pub use builder::{DependencyGraph, ModuleNode};
pub use cycles::{find_circular_pairs, CircularPair};
pub use distance::{analyze_distances, CoupledPair, DistanceGraph, DistanceSummary, HubModule};
pub use layers::{classify, classify_layers, Layer, LayerMap};
pub use orphans::{find_orphans, Orphan};
pub use registry::{canonical_id, detect_root_package, ModuleRegistry};
pub use resolver::{ReferenceResolver, Resolution};
