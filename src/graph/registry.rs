//! Module registry: maps every analyzed file to a canonical dotted module id
//!
//! Ids are derived purely from file location: strip the source root, join the
//! path segments with `.`, drop the extension and a trailing `__init__`, then
//! prepend the root package when one is configured. The mapping is injective;
//! colliding files get a fallback id and a warning.

use crate::models::Warning;
use crate::parsers::ImportRecord;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

const PACKAGE_INDEX: &str = "__init__";

/// Bidirectional file <-> module id mapping for one analysis run
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    /// id -> file (sorted by id)
    modules: BTreeMap<String, PathBuf>,
    /// file -> id
    by_file: HashMap<PathBuf, String>,
    root_package: Option<String>,
}

impl ModuleRegistry {
    /// Register `files` (paths relative to the analysis root).
    ///
    /// Files are processed in byte-wise path order, so on a collision the
    /// file that sorts first keeps the canonical id (`a.py` before
    /// `a/__init__.py`).
    pub fn build(
        files: &[PathBuf],
        source_root: &Path,
        root_package: Option<&str>,
        warnings: &mut Vec<Warning>,
    ) -> Self {
        let mut sorted: Vec<&PathBuf> = files.iter().collect();
        sorted.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        sorted.dedup();

        let mut registry = ModuleRegistry {
            root_package: root_package.map(str::to_string),
            ..Default::default()
        };

        for file in sorted {
            let id = canonical_id(file, source_root, root_package);
            let id = if registry.modules.contains_key(&id) {
                let fallback = registry.fallback_id(file, source_root, root_package);
                let message = format!(
                    "module id '{}' already taken by {}, registered as '{}'",
                    id,
                    registry.modules[&id].display(),
                    fallback
                );
                warn!("{}: {}", file.display(), message);
                warnings.push(Warning::new(file, message));
                fallback
            } else {
                id
            };

            registry.by_file.insert(file.clone(), id.clone());
            registry.modules.insert(id, file.clone());
        }

        debug!("Registered {} modules", registry.modules.len());
        registry
    }

    /// Unused id for a colliding file: the raw path-derived id (keeping any
    /// `__init__` segment), else the canonical id with a `~N` suffix.
    fn fallback_id(&self, file: &Path, source_root: &Path, root_package: Option<&str>) -> String {
        let raw = with_root_package(raw_segments(file, source_root).join("."), root_package);
        if !self.modules.contains_key(&raw) {
            return raw;
        }

        let base = canonical_id(file, source_root, root_package);
        let mut n = 2;
        loop {
            let candidate = format!("{}~{}", base, n);
            if !self.modules.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn root_package(&self) -> Option<&str> {
        self.root_package.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// The registered id equal to `id`, borrowed from the registry
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.modules.get_key_value(id).map(|(key, _)| key.as_str())
    }

    /// Source file registered under `id`
    pub fn file(&self, id: &str) -> Option<&Path> {
        self.modules.get(id).map(PathBuf::as_path)
    }

    /// Module id assigned to `file`
    pub fn id_of(&self, file: &Path) -> Option<&str> {
        self.by_file.get(file).map(String::as_str)
    }

    /// First registered id (in sorted order) nested under `parent`
    pub fn first_child_of(&self, parent: &str) -> Option<&str> {
        let prefix = format!("{}.", parent);
        self.modules
            .range(prefix.clone()..)
            .next()
            .map(|(id, _)| id.as_str())
            .filter(|id| id.starts_with(&prefix))
    }

    /// Module ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// (id, file) pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.modules
            .iter()
            .map(|(id, file)| (id.as_str(), file.as_path()))
    }

    /// Whether `id` is backed by a package index file (`__init__.py`)
    pub fn is_package_index(&self, id: &str) -> bool {
        self.file(id)
            .and_then(|f| f.file_stem())
            .and_then(|s| s.to_str())
            == Some(PACKAGE_INDEX)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Canonical dotted module id for a file
pub fn canonical_id(file: &Path, source_root: &Path, root_package: Option<&str>) -> String {
    let mut segments = raw_segments(file, source_root);
    // A lone top-level __init__.py keeps its segment
    if segments.len() > 1 && segments.last().map(String::as_str) == Some(PACKAGE_INDEX) {
        segments.pop();
    }
    with_root_package(segments.join("."), root_package)
}

/// Path segments below the source root with the extension removed
fn raw_segments(file: &Path, source_root: &Path) -> Vec<String> {
    let relative = file.strip_prefix(source_root).unwrap_or(file);
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.last_mut() {
        let stem = Path::new(last.as_str())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        if let Some(stem) = stem {
            *last = stem;
        }
    }

    segments
}

fn with_root_package(id: String, root_package: Option<&str>) -> String {
    match root_package {
        Some(pkg) if !pkg.is_empty() && id != pkg && !id.starts_with(&format!("{}.", pkg)) => {
            if id.is_empty() {
                pkg.to_string()
            } else {
                format!("{}.{}", pkg, id)
            }
        }
        _ => id,
    }
}

/// Pick the project's root package.
///
/// Candidates are top-level directories under `source_root` that have an
/// `__init__.py` in the file set. The candidate named most often as the first
/// segment of an absolute import wins; ties go to the candidate with more
/// files, then to the alphabetically first name.
pub fn detect_root_package<'a>(
    files: &[PathBuf],
    source_root: &Path,
    imports: impl IntoIterator<Item = &'a ImportRecord>,
) -> Option<String> {
    let mut file_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut packages: Vec<String> = Vec::new();

    for file in files {
        let segments: Vec<String> = file
            .strip_prefix(source_root)
            .unwrap_or(file)
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if segments.len() < 2 {
            continue;
        }
        *file_counts.entry(segments[0].clone()).or_default() += 1;
        let stem = Path::new(&segments[1]).file_stem().and_then(|s| s.to_str());
        if segments.len() == 2 && stem == Some(PACKAGE_INDEX) {
            packages.push(segments[0].clone());
        }
    }

    packages.sort();
    packages.dedup();
    if packages.is_empty() {
        return None;
    }

    let mut references: HashMap<&str, usize> = HashMap::new();
    for record in imports {
        for name in &record.absolute {
            let first = name.split('.').next().unwrap_or("");
            if let Some(pkg) = packages.iter().find(|p| p.as_str() == first) {
                *references.entry(pkg.as_str()).or_default() += 1;
            }
        }
    }

    let chosen = packages
        .iter()
        .max_by(|a, b| {
            let refs = |p: &str| references.get(p).copied().unwrap_or(0);
            let count = |p: &str| file_counts.get(p).copied().unwrap_or(0);
            refs(a)
                .cmp(&refs(b))
                .then(count(a).cmp(&count(b)))
                .then(b.cmp(a))
        })
        .cloned();

    if let Some(ref pkg) = chosen {
        debug!("Auto-detected root package '{}'", pkg);
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_canonical_id() {
        let root = Path::new("");
        assert_eq!(canonical_id(Path::new("a/b/c.py"), root, None), "a.b.c");
        assert_eq!(canonical_id(Path::new("a/b/__init__.py"), root, None), "a.b");
        assert_eq!(canonical_id(Path::new("__init__.py"), root, None), "__init__");
        assert_eq!(canonical_id(Path::new("stubs/mod.pyi"), root, None), "stubs.mod");
    }

    #[test]
    fn test_canonical_id_with_source_root() {
        let root = Path::new("src");
        assert_eq!(canonical_id(Path::new("src/app/core.py"), root, None), "app.core");
        // Files outside the source root keep their full relative path
        assert_eq!(
            canonical_id(Path::new("tests/test_core.py"), root, None),
            "tests.test_core"
        );
    }

    #[test]
    fn test_root_package_prefix() {
        let root = Path::new("");
        let pkg = Some("kosmos");
        assert_eq!(canonical_id(Path::new("kosmos/core.py"), root, pkg), "kosmos.core");
        assert_eq!(canonical_id(Path::new("kosmos/__init__.py"), root, pkg), "kosmos");
        assert_eq!(canonical_id(Path::new("tools/run.py"), root, pkg), "kosmos.tools.run");
        // Prefix match must be a whole segment
        assert_eq!(
            canonical_id(Path::new("kosmosx/a.py"), root, pkg),
            "kosmos.kosmosx.a"
        );
    }

    #[test]
    fn test_collision_gets_fallback_id() {
        let mut warnings = Vec::new();
        let files = paths(&["a/__init__.py", "a.py", "b.py"]);
        let registry = ModuleRegistry::build(&files, Path::new(""), None, &mut warnings);

        assert_eq!(registry.len(), 3);
        // "a.py" sorts first and keeps the canonical id
        assert_eq!(registry.id_of(Path::new("a.py")), Some("a"));
        assert_eq!(registry.id_of(Path::new("a/__init__.py")), Some("a.__init__"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "a/__init__.py");
    }

    #[test]
    fn test_collision_suffix_when_raw_id_taken() {
        let mut warnings = Vec::new();
        let files = paths(&["pkg/a.py", "pkg/a.pyi", "pkg/a/__init__.py"]);
        let registry = ModuleRegistry::build(&files, Path::new(""), None, &mut warnings);

        let ids: HashSet<&str> = registry.ids().collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("pkg.a"));
        assert!(ids.contains("pkg.a.__init__"));
        assert!(ids.contains("pkg.a~2"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_registry_is_injective() {
        let mut warnings = Vec::new();
        let files = paths(&[
            "__init__.py",
            "x.py",
            "x/__init__.py",
            "x/y.py",
            "x/y/__init__.py",
            "x/y.pyi",
            "z/__init__.py",
            "z/w.py",
        ]);
        let registry = ModuleRegistry::build(&files, Path::new(""), None, &mut warnings);

        assert_eq!(registry.len(), files.len());
        let ids: HashSet<&str> = files.iter().filter_map(|f| registry.id_of(f)).collect();
        assert_eq!(ids.len(), files.len());
    }

    #[test]
    fn test_first_child_of() {
        let mut warnings = Vec::new();
        let files = paths(&["imp/sub/b.py", "imp/sub/a.py", "impx.py"]);
        let registry = ModuleRegistry::build(&files, Path::new(""), None, &mut warnings);

        assert_eq!(registry.first_child_of("imp"), Some("imp.sub.a"));
        assert_eq!(registry.first_child_of("imp.sub"), Some("imp.sub.a"));
        assert_eq!(registry.first_child_of("impx"), None);
        assert_eq!(registry.first_child_of("other"), None);
    }

    #[test]
    fn test_is_package_index() {
        let mut warnings = Vec::new();
        let files = paths(&["pkg/__init__.py", "pkg/mod.py"]);
        let registry = ModuleRegistry::build(&files, Path::new(""), None, &mut warnings);

        assert!(registry.is_package_index("pkg"));
        assert!(!registry.is_package_index("pkg.mod"));
        assert_eq!(registry.file("pkg.mod"), Some(Path::new("pkg/mod.py")));
    }

    #[test]
    fn test_detect_root_package_by_references() {
        let files = paths(&[
            "big/__init__.py",
            "big/a.py",
            "big/b.py",
            "big/c.py",
            "small/__init__.py",
            "small/x.py",
        ]);
        let record = ImportRecord {
            absolute: vec!["small.x".into(), "small".into(), "big.a".into()],
            ..Default::default()
        };

        let detected = detect_root_package(&files, Path::new(""), [&record]);
        assert_eq!(detected.as_deref(), Some("small"));
    }

    #[test]
    fn test_detect_root_package_tie_breaks() {
        let files = paths(&[
            "beta/__init__.py",
            "beta/a.py",
            "alpha/__init__.py",
            "alpha/a.py",
            "gamma/__init__.py",
        ]);

        // No references: file count decides, then name
        let detected = detect_root_package(&files, Path::new(""), std::iter::empty());
        assert_eq!(detected.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_detect_root_package_requires_package_dir() {
        let files = paths(&["scripts/run.py", "main.py", "lib/deep/__init__.py"]);
        assert_eq!(detect_root_package(&files, Path::new(""), std::iter::empty()), None);
    }
}
