//! Project-level configuration support
//!
//! Loads per-project configuration from `xray.toml` or `.xrayrc.json` in the
//! repository root. Every field has a default, so an empty file (or no file at
//! all) yields the stock behavior.
//!
//! # Configuration Format
//!
//! ```toml
//! # xray.toml
//!
//! [analysis]
//! root_package = "kosmos"
//! max_distance_nodes = 3000
//!
//! [layers]
//! orchestration_keywords = ["manager", "workflow", "pipeline"]
//! foundation_ratio = 2.5
//!
//! [orphans]
//! entry_points = ["main.py", "cli.py"]
//!
//! [scoring]
//! top_n = 30
//! four_signal = { complexity = 0.4, imports = 0.2, risk = 0.25, freshness = 0.15 }
//!
//! [exclude]
//! paths = ["generated/**", "**/migrations/**"]
//!
//! [git]
//! months = 12
//! ```

use crate::error::{XrayError, XrayResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level names of the Python standard library and builtins.
///
/// Unresolved imports whose first segment is listed here are treated as
/// recognized non-project dependencies and never reported as external.
pub const PYTHON_STDLIB_MODULES: &[&str] = &[
    "__future__", "_thread", "abc", "argparse", "array", "ast", "asyncio", "atexit",
    "base64", "bdb", "binascii", "bisect", "builtins", "bz2", "calendar", "cmath",
    "cmd", "code", "codecs", "collections", "colorsys", "concurrent", "configparser",
    "contextlib", "contextvars", "copy", "copyreg", "cProfile", "csv", "ctypes",
    "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib", "dis",
    "doctest", "email", "encodings", "enum", "errno", "faulthandler", "fcntl",
    "filecmp", "fileinput", "fnmatch", "fractions", "ftplib", "functools", "gc",
    "getopt", "getpass", "gettext", "glob", "graphlib", "grp", "gzip", "hashlib",
    "heapq", "hmac", "html", "http", "imaplib", "importlib", "inspect", "io",
    "ipaddress", "itertools", "json", "keyword", "linecache", "locale", "logging",
    "lzma", "mailbox", "marshal", "math", "mimetypes", "mmap", "multiprocessing",
    "netrc", "numbers", "operator", "optparse", "os", "pathlib", "pdb", "pickle",
    "pkgutil", "platform", "plistlib", "poplib", "posix", "pprint", "profile",
    "pstats", "pty", "pwd", "py_compile", "queue", "quopri", "random", "re",
    "readline", "reprlib", "resource", "runpy", "sched", "secrets", "select",
    "selectors", "shelve", "shlex", "shutil", "signal", "site", "smtplib", "socket",
    "socketserver", "sqlite3", "ssl", "stat", "statistics", "string", "stringprep",
    "struct", "subprocess", "symtable", "sys", "sysconfig", "syslog", "tarfile",
    "tempfile", "termios", "textwrap", "threading", "time", "timeit", "tkinter",
    "token", "tokenize", "tomllib", "trace", "traceback", "tracemalloc", "tty",
    "turtle", "types", "typing", "unicodedata", "unittest", "urllib", "uuid",
    "venv", "warnings", "wave", "weakref", "webbrowser", "winreg", "wsgiref",
    "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib", "zoneinfo",
];

/// Project-level configuration loaded from xray.toml or .xrayrc.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct XrayConfig {
    /// Run-level analysis options
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Path exclusion patterns
    #[serde(default)]
    pub exclude: ExcludeConfig,

    /// Reference resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Layer classification tables
    #[serde(default)]
    pub layers: LayerRules,

    /// Orphan detection tables
    #[serde(default)]
    pub orphans: OrphanRules,

    /// Priority scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Git history signal settings
    #[serde(default)]
    pub git: GitConfig,
}

/// Run-level analysis options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Explicit root package prepended to module ids
    pub root_package: Option<String>,

    /// Auto-detect the root package when none is given
    pub auto_detect_root: bool,

    /// Override for the directory module ids are derived relative to
    pub source_root: Option<PathBuf>,

    /// Extraction worker count (default: available parallelism)
    pub workers: Option<usize>,

    /// Distance analysis is skipped above this many modules
    pub max_distance_nodes: usize,

    /// Source file extensions to analyze
    pub extensions: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root_package: None,
            auto_detect_root: true,
            source_root: None,
            workers: None,
            max_distance_nodes: 5000,
            extensions: vec!["py".to_string(), "pyi".to_string()],
        }
    }
}

/// Path exclusion configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExcludeConfig {
    /// Glob patterns (relative to the repository root) to exclude
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Reference resolution settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Known standard/builtin top-level names (replaces the stock list)
    pub known_modules: Vec<String>,

    /// Additional known names appended to `known_modules`
    pub extra_known_modules: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            known_modules: PYTHON_STDLIB_MODULES.iter().map(|s| s.to_string()).collect(),
            extra_known_modules: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// All names treated as recognized non-project dependencies
    pub fn known_set(&self) -> HashSet<String> {
        self.known_modules
            .iter()
            .chain(self.extra_known_modules.iter())
            .cloned()
            .collect()
    }
}

/// Keyword tables and thresholds for architectural layer classification
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayerRules {
    /// Substrings that mark a module as orchestration (checked first)
    pub orchestration_keywords: Vec<String>,

    /// Substrings that mark a module as foundation
    pub foundation_keywords: Vec<String>,

    /// `imported_by / (imports + 1)` above this is foundation
    pub foundation_ratio: f64,

    /// Ratio below this (with enough imports) is orchestration
    pub orchestration_ratio: f64,

    /// Minimum imports for the ratio-based orchestration rule (exclusive)
    pub orchestration_min_imports: usize,
}

impl Default for LayerRules {
    fn default() -> Self {
        Self {
            orchestration_keywords: [
                "manager",
                "orchestrator",
                "coordinator",
                "workflow",
                "pipeline",
                "factory",
                "runner",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            foundation_keywords: [
                "util", "utils", "base", "common", "helper", "abstract", "config", "constants",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            foundation_ratio: 2.0,
            orchestration_ratio: 0.5,
            orchestration_min_imports: 2,
        }
    }
}

/// Entry-point names, keyword tables and confidences for orphan detection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrphanRules {
    /// File names that are deliberate entry points
    pub entry_points: Vec<String>,

    /// Test file name prefixes
    pub test_prefixes: Vec<String>,

    /// Test file name suffixes
    pub test_suffixes: Vec<String>,

    /// Path substrings that suggest an ad-hoc script
    pub script_keywords: Vec<String>,

    /// File name substrings that suggest deprecated code
    pub deprecated_keywords: Vec<String>,

    /// File name substrings that suggest a generic utility
    pub utility_keywords: Vec<String>,

    pub base_confidence: f64,
    pub script_confidence: f64,
    pub deprecated_confidence: f64,
    pub utility_confidence: f64,
}

impl Default for OrphanRules {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            entry_points: strings(&[
                "main.py",
                "__main__.py",
                "__init__.py",
                "cli.py",
                "app.py",
                "wsgi.py",
                "asgi.py",
                "setup.py",
                "manage.py",
                "fabfile.py",
                "conftest.py",
                "noxfile.py",
            ]),
            test_prefixes: strings(&["test_"]),
            test_suffixes: strings(&["_test.py"]),
            script_keywords: strings(&["script"]),
            deprecated_keywords: strings(&["deprecated", "legacy", "old"]),
            utility_keywords: strings(&["util", "helper"]),
            base_confidence: 0.9,
            script_confidence: 0.6,
            deprecated_confidence: 0.95,
            utility_confidence: 0.7,
        }
    }
}

/// Weights for one composite priority formula
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormulaWeights {
    pub complexity: f64,
    pub imports: f64,
    pub risk: f64,
    pub freshness: f64,
    pub untested: f64,
}

impl Default for FormulaWeights {
    fn default() -> Self {
        Self::four_signal()
    }
}

impl FormulaWeights {
    /// Weights used when no test-coverage data is available
    pub fn four_signal() -> Self {
        Self {
            complexity: 0.35,
            imports: 0.25,
            risk: 0.25,
            freshness: 0.15,
            untested: 0.0,
        }
    }

    /// Weights used when test-coverage data is available
    pub fn five_signal() -> Self {
        Self {
            complexity: 0.30,
            imports: 0.20,
            risk: 0.20,
            freshness: 0.15,
            untested: 0.15,
        }
    }

    fn sum(&self) -> f64 {
        self.complexity + self.imports + self.risk + self.freshness + self.untested
    }

    /// Validate that weights sum to 1.0 (with tolerance)
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() < 0.001
    }

    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.complexity /= sum;
            self.imports /= sum;
            self.risk /= sum;
            self.freshness /= sum;
            self.untested /= sum;
        }
    }
}

/// Priority scoring configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Formula used without coverage data
    pub four_signal: FormulaWeights,

    /// Formula used with coverage data
    pub five_signal: FormulaWeights,

    /// Length of the ranked list before high-risk re-injection
    pub top_n: usize,

    /// Raw git risk above which a file is re-injected into the list
    pub risk_threshold: f64,

    /// Maximum number of re-injected high-risk files
    pub max_risk_injections: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            four_signal: FormulaWeights::four_signal(),
            five_signal: FormulaWeights::five_signal(),
            top_n: 20,
            risk_threshold: 0.7,
            max_risk_injections: 3,
        }
    }
}

/// Git history signal settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Collect git signals when the target is inside a repository
    pub enabled: bool,

    /// Months of history considered for risk
    pub months: u32,

    /// Upper bound on commits walked
    pub max_commits: usize,

    /// Commit subject keywords that mark a hotfix
    pub hotfix_keywords: Vec<String>,

    /// Age (days) below which a file is active
    pub active_days: i64,

    /// Age (days) below which a file is aging
    pub aging_days: i64,

    /// Age (days) below which a file is stale; older is dormant
    pub stale_days: i64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            months: 6,
            max_commits: 5000,
            hotfix_keywords: ["fix", "bug", "urgent", "revert", "hotfix", "patch", "emergency"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            active_days: 30,
            aging_days: 90,
            stale_days: 180,
        }
    }
}

/// Load project configuration from the repository root.
///
/// Searches for configuration files in this order:
/// 1. `xray.toml`
/// 2. `.xrayrc.json`
///
/// Returns default configuration if no config file is found or the file
/// cannot be parsed (the failure is logged).
pub fn load_project_config(repo_path: &Path) -> XrayConfig {
    for name in ["xray.toml", ".xrayrc.json"] {
        let path = repo_path.join(name);
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("{}", e);
            }
        }
    }

    debug!("No project config found, using defaults");
    XrayConfig::default()
}

/// Load configuration from an explicit TOML or JSON file.
pub fn load_config_file(path: &Path) -> XrayResult<XrayConfig> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");

    let parsed = if is_json {
        serde_json::from_str::<XrayConfig>(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str::<XrayConfig>(&content).map_err(|e| e.to_string())
    };

    let mut config = parsed.map_err(|message| XrayError::Config {
        path: path.to_path_buf(),
        message,
    })?;

    for (name, weights) in [
        ("four_signal", &mut config.scoring.four_signal),
        ("five_signal", &mut config.scoring.five_signal),
    ] {
        if !weights.is_valid() {
            warn!("scoring.{} weights do not sum to 1.0, normalizing", name);
            weights.normalize();
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = XrayConfig::default();

        assert!(config.analysis.auto_detect_root);
        assert_eq!(config.analysis.max_distance_nodes, 5000);
        assert_eq!(config.scoring.top_n, 20);
        assert!(config.scoring.four_signal.is_valid());
        assert!(config.scoring.five_signal.is_valid());
        assert!(config.resolver.known_set().contains("os"));
        assert!(config.layers.orchestration_keywords.contains(&"manager".to_string()));
        assert!(config.orphans.entry_points.contains(&"__init__.py".to_string()));
    }

    #[test]
    fn test_formula_weights_normalize() {
        let mut weights = FormulaWeights {
            complexity: 2.0,
            imports: 1.0,
            risk: 1.0,
            freshness: 0.0,
            untested: 0.0,
        };
        assert!(!weights.is_valid());
        weights.normalize();
        assert!(weights.is_valid());
        assert!((weights.complexity - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
[analysis]
root_package = "kosmos"
max_distance_nodes = 100

[layers]
foundation_keywords = ["shared"]
foundation_ratio = 3.0

[orphans]
entry_points = ["run.py"]

[scoring]
top_n = 5
four_signal = { complexity = 0.5, imports = 0.2, risk = 0.2, freshness = 0.1 }

[exclude]
paths = ["generated/**"]

[resolver]
extra_known_modules = ["numpy"]
"#;

        let config: XrayConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.analysis.root_package.as_deref(), Some("kosmos"));
        assert_eq!(config.analysis.max_distance_nodes, 100);
        // Unspecified fields keep their defaults
        assert!(config.analysis.auto_detect_root);
        assert_eq!(config.layers.foundation_keywords, vec!["shared".to_string()]);
        assert!(!config.layers.orchestration_keywords.is_empty());
        assert!((config.layers.foundation_ratio - 3.0).abs() < 0.001);
        assert_eq!(config.orphans.entry_points, vec!["run.py".to_string()]);
        assert_eq!(config.scoring.top_n, 5);
        assert!((config.scoring.four_signal.complexity - 0.5).abs() < 0.001);
        assert_eq!(config.scoring.four_signal.untested, 0.0);
        assert_eq!(config.exclude.paths.len(), 1);
        let known = config.resolver.known_set();
        assert!(known.contains("numpy"));
        assert!(known.contains("sys"));
    }

    #[test]
    fn test_load_project_config_prefers_toml() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("xray.toml"), "[scoring]\ntop_n = 7\n").unwrap();
        std::fs::write(
            dir.path().join(".xrayrc.json"),
            r#"{"scoring": {"top_n": 9}}"#,
        )
        .unwrap();

        let config = load_project_config(dir.path());
        assert_eq!(config.scoring.top_n, 7);
    }

    #[test]
    fn test_load_json_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".xrayrc.json");
        std::fs::write(&path, r#"{"git": {"enabled": false, "months": 3}}"#).unwrap();

        let config = load_project_config(dir.path());
        assert!(!config.git.enabled);
        assert_eq!(config.git.months, 3);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("xray.toml"), "[scoring\ntop_n = ").unwrap();

        let config = load_project_config(dir.path());
        assert_eq!(config.scoring.top_n, 20);

        let err = load_config_file(&dir.path().join("xray.toml")).unwrap_err();
        assert!(matches!(err, XrayError::Config { .. }));
    }

    #[test]
    fn test_unbalanced_weights_are_normalized_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[scoring.five_signal]\ncomplexity = 1.0\nimports = 1.0\nrisk = 1.0\nfreshness = 1.0\nuntested = 1.0\n",
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert!(config.scoring.five_signal.is_valid());
        assert!((config.scoring.five_signal.untested - 0.2).abs() < 0.001);
    }
}
