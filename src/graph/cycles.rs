//! Mutual-import cycle detection
//!
//! Streams the edge list once with a seen-pairs set. Only direct pairs
//! (A imports B and B imports A) are reported; longer cycles such as
//! A -> B -> C -> A are not enumerated.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Unordered pair of mutually importing modules, stored as (min, max)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CircularPair {
    pub a: String,
    pub b: String,
}

impl CircularPair {
    pub fn new(x: &str, y: &str) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.a == id || self.b == id
    }
}

/// Find every bidirectional edge pair, deduplicated and sorted
pub fn find_circular_pairs<'e>(
    edges: impl IntoIterator<Item = &'e (String, String)>,
) -> Vec<CircularPair> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut pairs: BTreeSet<CircularPair> = BTreeSet::new();

    for (from, to) in edges {
        if seen.contains(&(to.as_str(), from.as_str())) {
            pairs.insert(CircularPair::new(from, to));
        }
        seen.insert((from.as_str(), to.as_str()));
    }

    pairs.into_iter().collect()
}
