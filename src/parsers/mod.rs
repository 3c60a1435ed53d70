//! Source parsers using tree-sitter
//!
//! Extracts the per-file facts the engine needs from one parse: declared
//! imports (absolute, relative and aliased), whether the file can be run as a
//! program, and per-function cyclomatic complexity.

pub mod python;

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A relative import reference: `level` leading dots plus a dotted name
/// (empty for `from . import *`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RelativeImport {
    pub level: usize,
    pub name: String,
}

impl RelativeImport {
    pub fn new(level: usize, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RelativeImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", ".".repeat(self.level), self.name)
    }
}

/// Imports declared by one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportRecord {
    /// Absolute dotted names, in source order
    pub absolute: Vec<String>,
    /// Relative references, in source order
    pub relative: Vec<RelativeImport>,
    /// Declared alias -> dotted target
    pub aliases: BTreeMap<String, String>,
}

impl ImportRecord {
    pub fn is_empty(&self) -> bool {
        self.absolute.is_empty() && self.relative.is_empty() && self.aliases.is_empty()
    }
}

/// Cyclomatic complexity of one function or method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionComplexity {
    /// Dotted name within the file (`Class.method`, `outer.inner`)
    pub name: String,
    pub line: u32,
    pub complexity: u32,
}

/// Everything extracted from a single source file
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub imports: ImportRecord,
    /// File contains an `if __name__ == "__main__"` guard
    pub has_main_guard: bool,
    pub functions: Vec<FunctionComplexity>,
}

impl ParsedFile {
    /// Sum of per-function complexity, the file-level complexity signal
    pub fn total_complexity(&self) -> u32 {
        self.functions.iter().map(|f| f.complexity).sum()
    }
}

/// Parse a file and extract imports, main guard and complexity
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        "py" | "pyi" => python::parse(path),
        // Unknown extension
        _ => Ok(ParsedFile::default()),
    }
}

/// Get all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &["py", "pyi"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_import_display() {
        assert_eq!(RelativeImport::new(2, "core.base").to_string(), "..core.base");
        assert_eq!(RelativeImport::new(1, "").to_string(), ".");
    }

    #[test]
    fn test_total_complexity() {
        let parsed = ParsedFile {
            functions: vec![
                FunctionComplexity {
                    name: "a".into(),
                    line: 1,
                    complexity: 3,
                },
                FunctionComplexity {
                    name: "b".into(),
                    line: 5,
                    complexity: 4,
                },
            ],
            ..Default::default()
        };
        assert_eq!(parsed.total_complexity(), 7);
    }

    #[test]
    fn test_unknown_extension_is_empty() {
        let parsed = parse_file(Path::new("README.md")).unwrap();
        assert!(parsed.imports.is_empty());
        assert!(parsed.functions.is_empty());
    }
}
