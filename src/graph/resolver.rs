//! Import reference resolution
//!
//! Matches raw import references against the module registry with a fixed,
//! ordered strategy chain. The resolver only reads the registry and its
//! configuration, so resolving the same reference twice always gives the same
//! answer.

use crate::config::ResolverConfig;
use crate::graph::registry::ModuleRegistry;
use crate::parsers::RelativeImport;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::trace;

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A registered module id
    Internal(String),
    /// Unresolved absolute reference; carries its top-level name
    External(String),
    /// Unresolved reference to a known standard/builtin module
    Known,
    /// Relative reference with no registered target
    Unresolved,
}

/// Which strategy produced an internal match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Exact,
    PackagePrefix,
    ParentModule,
    LeafName,
    Relative,
}

/// Resolves references against a static registry
pub struct ReferenceResolver<'a> {
    registry: &'a ModuleRegistry,
    known: HashSet<String>,
    /// last id segment -> ids ending with it (sorted)
    by_leaf: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(registry: &'a ModuleRegistry, config: &ResolverConfig) -> Self {
        let mut by_leaf: BTreeMap<&'a str, Vec<&'a str>> = BTreeMap::new();
        // ids() is sorted, so each candidate list is too
        for id in registry.ids() {
            let leaf = id.rsplit('.').next().unwrap_or(id);
            by_leaf.entry(leaf).or_default().push(id);
        }

        Self {
            registry,
            known: config.known_set(),
            by_leaf,
        }
    }

    /// Resolve an absolute reference made by `importer`
    pub fn resolve_absolute(&self, importer: &str, reference: &str) -> Resolution {
        if let Some((id, strategy)) = self.match_absolute(importer, reference) {
            trace!("{} -> {} via {:?}", reference, id, strategy);
            return Resolution::Internal(id.to_string());
        }

        let top = reference.split('.').next().unwrap_or(reference);
        if top.is_empty() || self.known.contains(top) {
            Resolution::Known
        } else {
            Resolution::External(top.to_string())
        }
    }

    /// Strategies 1-4, first success wins
    fn match_absolute(&self, importer: &str, reference: &str) -> Option<(&'a str, Strategy)> {
        let registry = self.registry;

        // 1. Exact id
        if let Some(id) = registry.lookup(reference) {
            return Some((id, Strategy::Exact));
        }

        // 2. Reference is a package containing registered modules
        if let Some(id) = registry.first_child_of(reference) {
            return Some((id, Strategy::PackagePrefix));
        }

        // 3. Reference names a symbol inside a registered module
        let segments: Vec<&str> = reference.split('.').collect();
        for end in (1..segments.len()).rev() {
            let parent = segments[..end].join(".");
            if let Some(id) = registry.lookup(&parent) {
                return Some((id, Strategy::ParentModule));
            }
        }

        // 4. Leaf-name match
        let leaf = segments.last().copied().unwrap_or(reference);
        let candidates = self.by_leaf.get(leaf)?;
        if candidates.len() == 1 {
            return Some((candidates[0], Strategy::LeafName));
        }

        let importer_dir = registry.file(importer).and_then(Path::parent);
        let same_dir = candidates.iter().find(|c| {
            importer_dir.is_some() && registry.file(c).and_then(Path::parent) == importer_dir
        });
        same_dir
            .or_else(|| candidates.first())
            .map(|id| (*id, Strategy::LeafName))
    }

    /// Resolve a relative reference made by `importer`.
    ///
    /// Ascends `level` packages from the importer (a package index counts as
    /// its own package), appends the name, then strips trailing segments until
    /// a registered id is found.
    pub fn resolve_relative(&self, importer: &str, reference: &RelativeImport) -> Resolution {
        let mut parts: Vec<&str> = importer.split('.').collect();

        let ascent = if self.registry.is_package_index(importer) {
            if parts.last() == Some(&"__init__") {
                parts.pop();
            }
            reference.level.saturating_sub(1)
        } else {
            reference.level
        };

        if ascent > parts.len() {
            return Resolution::Unresolved;
        }
        parts.truncate(parts.len() - ascent);
        if !reference.name.is_empty() {
            parts.extend(reference.name.split('.'));
        }

        while !parts.is_empty() {
            let candidate = parts.join(".");
            if self.registry.contains(&candidate) {
                trace!("{} -> {} via {:?}", reference, candidate, Strategy::Relative);
                return Resolution::Internal(candidate);
            }
            parts.pop();
        }

        Resolution::Unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn registry(files: &[&str], root_package: Option<&str>) -> ModuleRegistry {
        let files: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
        ModuleRegistry::build(&files, Path::new(""), root_package, &mut Vec::new())
    }

    fn internal(id: &str) -> Resolution {
        Resolution::Internal(id.to_string())
    }

    #[test]
    fn test_exact_match() {
        let reg = registry(&["app/core.py", "app/main.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(resolver.resolve_absolute("app.main", "app.core"), internal("app.core"));
    }

    #[test]
    fn test_package_prefix_match() {
        let reg = registry(&["imp/sub.py", "imp/other.py", "main.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        // "imp" has no __init__.py; first nested module in sorted order wins
        assert_eq!(resolver.resolve_absolute("main", "imp"), internal("imp.other"));
    }

    #[test]
    fn test_parent_module_match() {
        let reg = registry(&["app/models.py", "app/views.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(
            resolver.resolve_absolute("app.views", "app.models.User"),
            internal("app.models")
        );
    }

    #[test]
    fn test_parent_module_prefers_longest() {
        let reg = registry(&["a/__init__.py", "a/b.py", "main.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(resolver.resolve_absolute("main", "a.b.func"), internal("a.b"));
    }

    #[test]
    fn test_leaf_name_single_candidate() {
        let reg = registry(&["pkg/deep/helpers.py", "main.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(resolver.resolve_absolute("main", "helpers"), internal("pkg.deep.helpers"));
    }

    #[test]
    fn test_leaf_name_prefers_same_directory() {
        let reg = registry(
            &["alpha/utils.py", "beta/utils.py", "beta/service.py"],
            None,
        );
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(resolver.resolve_absolute("beta.service", "utils"), internal("beta.utils"));
    }

    #[test]
    fn test_leaf_name_falls_back_to_first_sorted() {
        let reg = registry(&["beta/utils.py", "alpha/utils.py", "gamma/service.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(resolver.resolve_absolute("gamma.service", "utils"), internal("alpha.utils"));
    }

    #[test]
    fn test_external_and_known() {
        let reg = registry(&["app/core.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(resolver.resolve_absolute("app.core", "os.path"), Resolution::Known);
        assert_eq!(
            resolver.resolve_absolute("app.core", "requests.adapters"),
            Resolution::External("requests".to_string())
        );
    }

    #[test]
    fn test_relative_from_module() {
        let reg = registry(&["pkg/a.py", "pkg/b.py", "pkg/sub/c.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(
            resolver.resolve_relative("pkg.a", &RelativeImport::new(1, "b")),
            internal("pkg.b")
        );
        assert_eq!(
            resolver.resolve_relative("pkg.sub.c", &RelativeImport::new(2, "a")),
            internal("pkg.a")
        );
        // Symbol import strips back to the module
        assert_eq!(
            resolver.resolve_relative("pkg.a", &RelativeImport::new(1, "b.Thing")),
            internal("pkg.b")
        );
    }

    #[test]
    fn test_relative_from_package_index() {
        let reg = registry(&["pkg/__init__.py", "pkg/a.py", "pkg/sub/__init__.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        // `from .a import x` inside pkg/__init__.py targets pkg.a
        assert_eq!(
            resolver.resolve_relative("pkg", &RelativeImport::new(1, "a")),
            internal("pkg.a")
        );
        assert_eq!(
            resolver.resolve_relative("pkg.sub", &RelativeImport::new(2, "a")),
            internal("pkg.a")
        );
    }

    #[test]
    fn test_relative_unresolved() {
        let reg = registry(&["a.py"], None);
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(
            resolver.resolve_relative("a", &RelativeImport::new(3, "x")),
            Resolution::Unresolved
        );
        assert_eq!(
            resolver.resolve_relative("a", &RelativeImport::new(1, "missing")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_resolution_with_root_package() {
        let reg = registry(&["core/engine.py", "core/utils.py"], Some("kosmos"));
        let resolver = ReferenceResolver::new(&reg, &ResolverConfig::default());

        assert_eq!(
            resolver.resolve_absolute("kosmos.core.engine", "kosmos.core.utils"),
            internal("kosmos.core.utils")
        );
        assert_eq!(
            resolver.resolve_relative("kosmos.core.engine", &RelativeImport::new(1, "utils")),
            internal("kosmos.core.utils")
        );
    }
}
