//! Git history analysis module
//!
//! Derives the maintenance-risk and freshness signals from commit history.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use repo_xray::config::GitConfig;
//! use repo_xray::git::GitHistory;
//! use std::path::{Path, PathBuf};
//!
//! let history = GitHistory::open(Path::new("/path/to/repo")).unwrap();
//! let files = vec![PathBuf::from("app/core.py")];
//! let signals = history
//!     .signals(Path::new("/path/to/repo"), &files, &GitConfig::default(), Utc::now())
//!     .unwrap();
//! println!("{} risky files", signals.risk.len());
//! ```

pub mod history;

pub use history::{
    freshness_buckets, is_hotfix, risk_records, CommitInfo, FileActivity, GitHistory, GitSignals,
};
