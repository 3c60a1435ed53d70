//! Fatal error conditions for an analysis run
//!
//! Only directory-level preconditions are fatal. Per-file problems are
//! recorded as warnings on the report and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an analysis run
#[derive(Error, Debug)]
pub enum XrayError {
    #[error("Target is not a readable directory: {}", path.display())]
    InvalidTarget { path: PathBuf },

    #[error("No source files found under {}", path.display())]
    NoSourceFiles { path: PathBuf },

    #[error("Invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type XrayResult<T> = Result<T, XrayError>;
