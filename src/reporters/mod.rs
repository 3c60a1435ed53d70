//! Output reporters for analysis results
//!
//! Supports two output formats:
//! - `text` - Terminal summary with colors
//! - `json` - Machine-readable JSON (the full report)

mod json;
mod text;

use crate::models::AnalysisReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a report in the specified format
pub fn report(report: &AnalysisReport, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a report using an OutputFormat enum
pub fn report_with_format(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::{CircularPair, DistanceSummary, LayerMap, Orphan};
    use crate::models::{Summary, Warning};
    use crate::scoring::{PriorityRecord, ScoreComponents, ScoringFormula, SignalAvailability};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    /// Create a minimal AnalysisReport for testing
    pub(crate) fn test_report() -> AnalysisReport {
        AnalysisReport {
            root: "/tmp/project".into(),
            root_package: Some("app".into()),
            summary: Summary {
                files: 3,
                modules: 3,
                edges: 3,
                circular: 1,
                orphans: 1,
                external_deps: 0,
                functions: 4,
                warnings: 1,
            },
            graph: BTreeMap::new(),
            layers: LayerMap::default(),
            circular: vec![CircularPair::new("app.a", "app.b")],
            external_deps: BTreeMap::new(),
            aliases: Vec::new(),
            alias_patterns: BTreeMap::new(),
            orphans: vec![Orphan {
                file: PathBuf::from("app/legacy_api.py"),
                module: "app.legacy_api".into(),
                confidence: 0.95,
                reason: "no importers; name mentions 'legacy'".into(),
            }],
            distances: DistanceSummary::default(),
            formula: ScoringFormula::FourSignal,
            signals: SignalAvailability {
                complexity: true,
                ..Default::default()
            },
            priorities: vec![PriorityRecord {
                file: "app/core.py".into(),
                module: "app.core".into(),
                score: 0.55,
                components: ScoreComponents {
                    complexity: Some(24),
                    ..Default::default()
                },
                reasons: vec!["CC:24".into()],
            }],
            warnings: vec![Warning::new(Path::new("app/broken.py"), "Syntax errors")],
            notes: vec!["git signals disabled".into()],
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_report_dispatch() {
        let rendered = report(&test_report(), "json").unwrap();
        assert!(rendered.trim_start().starts_with('{'));
        assert!(report(&test_report(), "yaml").is_err());
    }
}
