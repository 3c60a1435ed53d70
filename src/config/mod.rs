//! Configuration module for repo-xray
//!
//! This module handles:
//! - Project-level configuration (xray.toml / .xrayrc.json)
//! - Heuristic tables for layer classification and orphan detection
//! - Priority scoring weights
//! - Git history and resolver settings

mod project_config;

pub use project_config::{
    load_config_file,
    load_project_config,
    AnalysisConfig,
    ExcludeConfig,
    FormulaWeights,
    GitConfig,
    LayerRules,
    OrphanRules,
    ResolverConfig,
    ScoringConfig,
    XrayConfig,
    PYTHON_STDLIB_MODULES,
};
