//! Python parser using tree-sitter
//!
//! Extracts import declarations, the main guard and per-function cyclomatic
//! complexity from Python source code.

use crate::parsers::{FunctionComplexity, ImportRecord, ParsedFile, RelativeImport};
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::{Node, Parser};

static MAIN_GUARD: OnceLock<Regex> = OnceLock::new();

fn main_guard_pattern() -> &'static Regex {
    MAIN_GUARD.get_or_init(|| {
        Regex::new(r#"if\s+(__name__\s*==|['"]__main__['"]\s*==\s*__name__)"#)
            .expect("valid regex")
    })
}

/// Parse a Python file and extract imports, main guard and complexity
pub fn parse(path: &Path) -> Result<ParsedFile> {
    // Non-UTF-8 content fails here and is reported by the caller
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    parse_source(&source, path)
}

/// Parse Python source code directly (useful for testing)
pub fn parse_source(source: &str, path: &Path) -> Result<ParsedFile> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .context("Failed to set Python language")?;

    let tree = parser
        .parse(source, None)
        .context("Failed to parse Python source")?;

    let root = tree.root_node();
    if root.has_error() {
        bail!("Syntax errors in {}", path.display());
    }

    let source_bytes = source.as_bytes();
    let mut result = ParsedFile::default();

    extract_imports(root, source_bytes, &mut result.imports);
    extract_functions(root, source_bytes, &mut Vec::new(), &mut result.functions);
    result.has_main_guard = main_guard_pattern().is_match(source);

    Ok(result)
}

/// Collect every import statement in the tree, including nested ones
/// (function bodies, `try` blocks, `if TYPE_CHECKING:` blocks).
fn extract_imports(node: Node, source: &[u8], record: &mut ImportRecord) {
    match node.kind() {
        "import_statement" => {
            extract_import_statement(node, source, record);
            return;
        }
        "import_from_statement" => {
            extract_from_statement(node, source, record);
            return;
        }
        // `from __future__ import x` has its own node kind and is skipped
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_imports(child, source, record);
    }
}

/// `import a.b, c as d`
fn extract_import_statement(node: Node, source: &[u8], record: &mut ImportRecord) {
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                if let Ok(text) = child.utf8_text(source) {
                    record.absolute.push(text.to_string());
                }
            }
            "aliased_import" => {
                let (Some(name), alias) = aliased_parts(child, source) else {
                    continue;
                };
                if let Some(alias) = alias {
                    record.aliases.insert(alias, name.clone());
                }
                record.absolute.push(name);
            }
            _ => {}
        }
    }
}

/// `from m import x, y as z` and `from ..pkg import x`
fn extract_from_statement(node: Node, source: &[u8], record: &mut ImportRecord) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };

    // (imported name, optional alias)
    let mut names: Vec<(String, Option<String>)> = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                if let Ok(text) = child.utf8_text(source) {
                    names.push((text.to_string(), None));
                }
            }
            "aliased_import" => {
                if let (Some(name), alias) = aliased_parts(child, source) {
                    names.push((name, alias));
                }
            }
            _ => {}
        }
    }

    match module_node.kind() {
        "relative_import" => {
            let (level, module) = relative_parts(module_node, source);
            let prefix = ".".repeat(level);

            if module.is_empty() {
                // `from . import a, b` references each name as a sibling module
                if names.is_empty() {
                    record.relative.push(RelativeImport::new(level, ""));
                }
                for (name, _) in &names {
                    record.relative.push(RelativeImport::new(level, name.clone()));
                }
            } else {
                record.relative.push(RelativeImport::new(level, module.clone()));
            }

            for (name, alias) in names {
                if let Some(alias) = alias {
                    let target = if module.is_empty() {
                        format!("{}{}", prefix, name)
                    } else {
                        format!("{}{}.{}", prefix, module, name)
                    };
                    record.aliases.insert(alias, target);
                }
            }
        }
        _ => {
            let Ok(module) = module_node.utf8_text(source) else {
                return;
            };
            record.absolute.push(module.to_string());

            for (name, alias) in names {
                if let Some(alias) = alias {
                    record.aliases.insert(alias, format!("{}.{}", module, name));
                }
            }
        }
    }
}

/// Split an `aliased_import` into its dotted name and alias
fn aliased_parts(node: Node, source: &[u8]) -> (Option<String>, Option<String>) {
    let name = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok())
        .map(str::to_string);
    let alias = node
        .child_by_field_name("alias")
        .and_then(|n| n.utf8_text(source).ok())
        .map(str::to_string);
    (name, alias)
}

/// Split a `relative_import` into its dot count and (possibly empty) module
fn relative_parts(node: Node, source: &[u8]) -> (usize, String) {
    let mut level = 0;
    let mut module = String::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_prefix" => {
                level = child
                    .utf8_text(source)
                    .map(|t| t.chars().filter(|c| *c == '.').count())
                    .unwrap_or(0);
            }
            "dotted_name" => {
                module = child.utf8_text(source).unwrap_or("").to_string();
            }
            _ => {}
        }
    }

    (level, module)
}

/// Record every function and method with its complexity.
///
/// `scope` holds the enclosing class/function names so nested definitions
/// get a dotted name.
fn extract_functions(
    node: Node,
    source: &[u8],
    scope: &mut Vec<String>,
    out: &mut Vec<FunctionComplexity>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" | "class_definition" => {
                let name = child
                    .child_by_field_name("name")
                    .and_then(|n| n.utf8_text(source).ok())
                    .unwrap_or("<anonymous>");
                scope.push(name.to_string());

                if child.kind() == "function_definition" {
                    out.push(FunctionComplexity {
                        name: scope.join("."),
                        line: child.start_position().row as u32 + 1,
                        complexity: calculate_complexity(&child),
                    });
                }

                extract_functions(child, source, scope, out);
                scope.pop();
            }
            _ => extract_functions(child, source, scope, out),
        }
    }
}

/// Calculate cyclomatic complexity of a function.
///
/// Nested functions and classes are scored separately and excluded here so
/// that summing per-function values never double-counts a branch.
fn calculate_complexity(node: &Node) -> u32 {
    let mut complexity = 1; // Base complexity

    fn count_branches(node: &Node, complexity: &mut u32) {
        match node.kind() {
            "function_definition" | "class_definition" => return,
            // Control flow
            "if_statement" | "elif_clause" | "while_statement" | "for_statement" => {
                *complexity += 1;
            }
            // Exception handling
            "except_clause" => {
                *complexity += 1;
            }
            // Boolean operators (each 'and'/'or' adds a branch)
            "boolean_operator" => {
                *complexity += 1;
            }
            // Ternary/conditional expression
            "conditional_expression" => {
                *complexity += 1;
            }
            // Comprehensions with conditions
            "list_comprehension"
            | "dictionary_comprehension"
            | "set_comprehension"
            | "generator_expression" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "if_clause" {
                        *complexity += 1;
                    }
                }
            }
            // Match statement: each case adds a branch
            "match_statement" => {
                if let Some(body) = node.child_by_field_name("body") {
                    for child in body.children(&mut body.walk()) {
                        if child.kind() == "case_clause" {
                            *complexity += 1;
                        }
                    }
                }
            }
            "with_statement" | "assert_statement" => {
                *complexity += 1;
            }
            _ => {}
        }

        for child in node.children(&mut node.walk()) {
            count_branches(&child, complexity);
        }
    }

    for child in node.children(&mut node.walk()) {
        count_branches(&child, &mut complexity);
    }
    complexity
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse_str(source: &str) -> ParsedFile {
        parse_source(source, &PathBuf::from("test.py")).expect("should parse")
    }

    #[test]
    fn test_parse_absolute_imports() {
        let result = parse_str(
            r#"
import os
import sys, json
import a.b.c
from pathlib import Path
from typing import List, Optional
"#,
        );

        assert_eq!(
            result.imports.absolute,
            vec!["os", "sys", "json", "a.b.c", "pathlib", "typing"]
        );
        assert!(result.imports.relative.is_empty());
        assert!(result.imports.aliases.is_empty());
    }

    #[test]
    fn test_parse_relative_imports() {
        let result = parse_str(
            r#"
from . import a, b
from .mod import x
from ..core.base import Base
from .. import *
"#,
        );

        assert_eq!(
            result.imports.relative,
            vec![
                RelativeImport::new(1, "a"),
                RelativeImport::new(1, "b"),
                RelativeImport::new(1, "mod"),
                RelativeImport::new(2, "core.base"),
                RelativeImport::new(2, ""),
            ]
        );
        assert!(result.imports.absolute.is_empty());
    }

    #[test]
    fn test_parse_aliases() {
        let result = parse_str(
            r#"
import numpy as np
import a.b as c
from m import x as y
from .pkg import thing as t
"#,
        );

        let aliases = &result.imports.aliases;
        assert_eq!(aliases.get("np").map(String::as_str), Some("numpy"));
        assert_eq!(aliases.get("c").map(String::as_str), Some("a.b"));
        assert_eq!(aliases.get("y").map(String::as_str), Some("m.x"));
        assert_eq!(aliases.get("t").map(String::as_str), Some(".pkg.thing"));
        assert!(result.imports.absolute.contains(&"numpy".to_string()));
        assert!(result.imports.absolute.contains(&"a.b".to_string()));
        assert!(result.imports.absolute.contains(&"m".to_string()));
    }

    #[test]
    fn test_nested_imports_are_collected() {
        let result = parse_str(
            r#"
from typing import TYPE_CHECKING

if TYPE_CHECKING:
    from app.models import User

try:
    import ujson as json
except ImportError:
    import json

def lazy():
    import heavy.module
    return heavy.module
"#,
        );

        let absolute = &result.imports.absolute;
        assert!(absolute.contains(&"app.models".to_string()));
        assert!(absolute.contains(&"ujson".to_string()));
        assert!(absolute.contains(&"json".to_string()));
        assert!(absolute.contains(&"heavy.module".to_string()));
    }

    #[test]
    fn test_future_import_ignored() {
        let result = parse_str("from __future__ import annotations\nimport os\n");
        assert_eq!(result.imports.absolute, vec!["os"]);
    }

    #[test]
    fn test_main_guard_detection() {
        let with_guard = parse_str(
            r#"
def main():
    pass

if __name__ == "__main__":
    main()
"#,
        );
        assert!(with_guard.has_main_guard);

        let without_guard = parse_str("def main():\n    pass\n");
        assert!(!without_guard.has_main_guard);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = parse_source("def broken(:\n    pass\n", &PathBuf::from("bad.py"));
        assert!(err.is_err());
    }

    #[test]
    fn test_complexity_calculation() {
        let result = parse_str(
            r#"
def complex_func(x):
    if x > 0:
        if x > 10:
            return "big"
        elif x > 5:
            return "medium"
        else:
            return "small"
    elif x < 0:
        return "negative"
    else:
        return "zero"
"#,
        );

        assert_eq!(result.functions.len(), 1);
        let func = &result.functions[0];
        assert_eq!(func.name, "complex_func");
        // 1 base + 2 if + 2 elif
        assert_eq!(func.complexity, 5);
    }

    #[test]
    fn test_nested_functions_scored_separately() {
        let result = parse_str(
            r#"
class Service:
    def run(self, items):
        for item in items:
            if item:
                pass

        def helper(v):
            return v if v else None

        return helper

async def fetch(url):
    return url
"#,
        );

        let names: Vec<&str> = result.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Service.run", "Service.run.helper", "fetch"]);

        let run = &result.functions[0];
        // 1 base + for + if; the nested conditional expression is not counted
        assert_eq!(run.complexity, 3);
        let helper = &result.functions[1];
        assert_eq!(helper.complexity, 2);
        assert_eq!(result.total_complexity(), 6);
    }
}
