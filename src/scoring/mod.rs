//! Composite priority scoring
//!
//! Ranks analyzed files by "where should a developer look first". Each file
//! gets up to five signals, combined with one of two weighted formulas:
//!
//! ```text
//! four-signal: 0.35·CC + 0.25·Import + 0.25·Risk + 0.15·Freshness
//! five-signal: 0.30·CC + 0.20·Import + 0.20·Risk + 0.15·Freshness + 0.15·Untested
//! ```
//!
//! CC (summed function complexity) and Import (importer count) are min-max
//! normalized across files. Risk is the raw git risk score, Freshness the
//! bucket weight and Untested 1.0 / 0.0 / 0.5 for untested / tested / unknown.
//! The five-signal formula is used only when coverage data is present.

mod priority;

pub use priority::{PriorityRecord, PriorityScorer, ScoreComponents};

use crate::config::{FormulaWeights, ScoringConfig};
use crate::signals::SignalInputs;
use serde::Serialize;
use std::fmt;

/// Min-max normalize to [0, 1].
///
/// When every value is identical the spread is meaningless and each value
/// maps to 0.5.
pub fn normalize_values(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let range = max - min;

    if range.abs() < f64::EPSILON {
        return vec![0.5; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Which weighting formula a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormula {
    FourSignal,
    FiveSignal,
}

impl fmt::Display for ScoringFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringFormula::FourSignal => write!(f, "four-signal"),
            ScoringFormula::FiveSignal => write!(f, "five-signal"),
        }
    }
}

/// Which optional signals were supplied for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalAvailability {
    pub complexity: bool,
    pub git_risk: bool,
    pub freshness: bool,
    pub coverage: bool,
}

impl SignalAvailability {
    pub fn from_inputs(inputs: &SignalInputs) -> Self {
        Self {
            complexity: inputs.complexity.is_some(),
            git_risk: inputs.git_risk.is_some(),
            freshness: inputs.freshness.is_some(),
            coverage: inputs.coverage.is_some(),
        }
    }

    pub fn formula(&self) -> ScoringFormula {
        if self.coverage {
            ScoringFormula::FiveSignal
        } else {
            ScoringFormula::FourSignal
        }
    }

    /// Configured weights for the selected formula
    pub fn weights(&self, config: &ScoringConfig) -> FormulaWeights {
        match self.formula() {
            ScoringFormula::FourSignal => config.four_signal,
            ScoringFormula::FiveSignal => config.five_signal,
        }
    }

    /// One informational note per missing signal
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !self.complexity {
            notes.push("complexity data unavailable; complexity contributes 0".to_string());
        }
        if !self.git_risk {
            notes.push("git risk data unavailable; risk contributes 0".to_string());
        }
        if !self.freshness {
            notes.push("freshness data unavailable; neutral weight 0.5 used".to_string());
        }
        if !self.coverage {
            notes.push("coverage data unavailable; using the four-signal formula".to_string());
        }
        notes
    }
}
