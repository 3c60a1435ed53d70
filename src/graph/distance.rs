//! Dependency distance and hub analysis
//!
//! Runs a breadth-first search from every module over forward (import) edges
//! of a petgraph `DiGraph`. Neighbors are visited in id order so recorded
//! paths are deterministic. Each search keeps only node-indexed distance and
//! predecessor vectors; a full scan folds them into running totals plus the
//! pairs close enough to count as tightly coupled.
//!
//! The all-sources BFS is O(V·(V+E)); above a configurable module count the
//! BFS metrics are skipped and the summary is flagged instead.

use crate::graph::builder::DependencyGraph;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// Pairs and hubs retained in the summary
const TOP_K: usize = 10;
/// Maximum hops (each direction) for a tightly coupled pair
const TIGHT_COUPLING_HOPS: usize = 2;

/// Two modules reachable from each other within two hops
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoupledPair {
    pub a: String,
    pub b: String,
    /// Hops from `a` to `b`
    pub forward: usize,
    /// Hops from `b` to `a`
    pub backward: usize,
    /// Shortest path from `a` to `b`, endpoints included
    pub path: Vec<String>,
}

/// A highly connected module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubModule {
    pub module: String,
    pub connections: usize,
    pub imports: usize,
    pub imported_by: usize,
}

/// Aggregate distance metrics for the whole graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistanceSummary {
    pub max_depth: usize,
    pub avg_depth: f64,
    /// Number of reachable (source, target) pairs
    pub reachable_pairs: usize,
    pub tightly_coupled: Vec<CoupledPair>,
    pub hub_modules: Vec<HubModule>,
    /// Distance analysis was skipped because the graph was too large
    pub skipped: bool,
}

/// Shortest-path tree rooted at one module
struct BfsTree {
    /// Hops from the root; None when unreachable
    dist: Vec<Option<usize>>,
    /// Predecessor on the recorded shortest path
    pred: Vec<Option<NodeIndex>>,
}

/// A pair found within the tight coupling radius during a scan
#[derive(Clone, Copy)]
struct NearPair {
    hops: usize,
    /// Intermediate module on a two-hop path
    via: Option<NodeIndex>,
}

/// Totals from a BFS over every module
struct Scan {
    max_depth: usize,
    total: usize,
    count: usize,
    near: HashMap<(NodeIndex, NodeIndex), NearPair>,
}

/// The import graph as a petgraph `DiGraph`, nodes in id order
pub struct DistanceGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DistanceGraph {
    pub fn build(deps: &DependencyGraph) -> Self {
        let mut graph = DiGraph::with_capacity(deps.len(), deps.edge_count());
        let mut index = HashMap::with_capacity(deps.len());

        // Nodes are added in id order, so NodeIndex order is id order
        for id in deps.modules().keys() {
            index.insert(id.clone(), graph.add_node(id.clone()));
        }
        for (id, node) in deps.modules() {
            for target in &node.imports {
                if let (Some(&from), Some(&to)) = (index.get(id), index.get(target)) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, index }
    }

    /// Hop count from `from` to `to` (None if unreachable, identical or unknown)
    pub fn hops(&self, from: &str, to: &str) -> Option<usize> {
        let (&f, &t) = (self.index.get(from)?, self.index.get(to)?);
        if f == t {
            return None;
        }
        self.bfs(f).dist[t.index()]
    }

    /// One shortest path from `from` to `to`, endpoints included
    pub fn path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let (&f, &t) = (self.index.get(from)?, self.index.get(to)?);
        if f == t {
            return None;
        }
        let tree = self.bfs(f);
        tree.dist[t.index()]?;

        let mut path = vec![t];
        let mut current = t;
        while current != f {
            current = tree.pred[current.index()]?;
            path.push(current);
        }
        path.reverse();
        Some(path.into_iter().map(|n| self.graph[n].clone()).collect())
    }

    fn bfs(&self, source: NodeIndex) -> BfsTree {
        let n = self.graph.node_count();
        let mut dist: Vec<Option<usize>> = vec![None; n];
        let mut pred: Vec<Option<NodeIndex>> = vec![None; n];
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();
        let mut next: Vec<NodeIndex> = Vec::new();

        dist[source.index()] = Some(0);
        queue.push_back((source, 0));

        while let Some((v, d)) = queue.pop_front() {
            next.clear();
            next.extend(self.graph.neighbors_directed(v, Direction::Outgoing));
            next.sort_unstable();
            next.dedup();

            for &w in &next {
                let wi = w.index();
                if dist[wi].is_none() {
                    dist[wi] = Some(d + 1);
                    pred[wi] = Some(v);
                    queue.push_back((w, d + 1));
                }
            }
        }

        BfsTree { dist, pred }
    }

    /// BFS from every module, keeping totals and near pairs only
    fn scan(&self) -> Scan {
        let mut scan = Scan {
            max_depth: 0,
            total: 0,
            count: 0,
            near: HashMap::new(),
        };

        for source in self.graph.node_indices() {
            let tree = self.bfs(source);
            for (ti, hops) in tree.dist.iter().enumerate() {
                let Some(hops) = *hops else { continue };
                if hops == 0 {
                    continue;
                }
                scan.max_depth = scan.max_depth.max(hops);
                scan.total += hops;
                scan.count += 1;

                if hops <= TIGHT_COUPLING_HOPS {
                    let target = NodeIndex::new(ti);
                    let via = tree.pred[ti].filter(|p| *p != source);
                    scan.near.insert((source, target), NearPair { hops, via });
                }
            }
        }

        scan
    }

    /// Pairs reachable from each other within two hops, tightest first
    fn tightly_coupled(&self, near: &HashMap<(NodeIndex, NodeIndex), NearPair>) -> Vec<CoupledPair> {
        let mut pairs: Vec<CoupledPair> = near
            .iter()
            .filter(|((a, b), _)| a < b)
            .filter_map(|(&(a, b), forward)| {
                let backward = near.get(&(b, a))?;
                let mut path = vec![self.graph[a].clone()];
                path.extend(forward.via.map(|v| self.graph[v].clone()));
                path.push(self.graph[b].clone());
                Some(CoupledPair {
                    a: self.graph[a].clone(),
                    b: self.graph[b].clone(),
                    forward: forward.hops,
                    backward: backward.hops,
                    path,
                })
            })
            .collect();

        pairs.sort_by(|x, y| {
            x.forward
                .max(x.backward)
                .cmp(&y.forward.max(y.backward))
                .then_with(|| x.a.cmp(&y.a))
                .then_with(|| x.b.cmp(&y.b))
        });
        pairs.truncate(TOP_K);
        pairs
    }
}

/// Modules with the highest total degree (ties by id), degree > 0
pub fn hub_modules(graph: &DependencyGraph) -> Vec<HubModule> {
    let mut hubs: Vec<HubModule> = graph
        .modules()
        .iter()
        .filter(|(_, node)| node.degree() > 0)
        .map(|(id, node)| HubModule {
            module: id.clone(),
            connections: node.degree(),
            imports: node.imports.len(),
            imported_by: node.imported_by.len(),
        })
        .collect();

    hubs.sort_by(|a, b| {
        b.connections
            .cmp(&a.connections)
            .then_with(|| a.module.cmp(&b.module))
    });
    hubs.truncate(TOP_K);
    hubs
}

/// Distance and hub summary, skipping BFS above `max_nodes` modules
pub fn analyze_distances(graph: &DependencyGraph, max_nodes: usize) -> DistanceSummary {
    let hub_modules = hub_modules(graph);

    if graph.len() > max_nodes {
        info!(
            "Skipping distance analysis: {} modules exceeds limit of {}",
            graph.len(),
            max_nodes
        );
        return DistanceSummary {
            hub_modules,
            skipped: true,
            ..Default::default()
        };
    }

    let distances = DistanceGraph::build(graph);
    let Scan {
        max_depth,
        total,
        count,
        near,
    } = distances.scan();
    let avg_depth = if count > 0 {
        ((total as f64 / count as f64) * 100.0).round() / 100.0
    } else {
        0.0
    };

    let tightly_coupled = distances.tightly_coupled(&near);
    debug!(
        "Distance analysis: {} reachable pairs, max depth {}, {} tightly coupled",
        count,
        max_depth,
        tightly_coupled.len()
    );

    DistanceSummary {
        max_depth,
        avg_depth,
        reachable_pairs: count,
        tightly_coupled,
        hub_modules,
        skipped: false,
    }
}
