//! repo-xray - Dependency graph X-ray for Python codebases
//!
//! Reconstructs a codebase's module dependency graph from its imports,
//! classifies modules into architectural layers, detects cycles, orphans and
//! coupling hotspots, and ranks files by where a developer should look first.
//!
//! # Example
//!
//! ```no_run
//! use repo_xray::config::XrayConfig;
//! use repo_xray::pipeline::Pipeline;
//! use std::path::Path;
//!
//! let report = Pipeline::new(XrayConfig::default())
//!     .without_git()
//!     .run(Path::new("/path/to/project"))
//!     .unwrap();
//! for record in &report.priorities {
//!     println!("{:.3} {}", record.score, record.file);
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod graph;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod reporters;
pub mod scoring;
pub mod signals;

pub use error::{XrayError, XrayResult};
