//! Parallel per-file extraction
//!
//! Each worker parses one file and returns an owned result; nothing is
//! shared between workers. Merging happens afterwards on the calling thread.

use crate::error::XrayResult;
use crate::models::Warning;
use crate::parsers::{parse_file, ParsedFile};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse results for a batch of files
#[derive(Debug, Default)]
pub struct Extraction {
    /// Files that parsed, in input order
    pub files: Vec<PathBuf>,
    /// Parse result for each entry of `files`
    pub parsed: Vec<ParsedFile>,
    /// One warning per file that could not be read or parsed
    pub warnings: Vec<Warning>,
}

/// Default worker count: available parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Parse `files` (relative to `root`) on a bounded thread pool.
///
/// A file that cannot be read or parsed is left out of the result and
/// reported as a warning; it never fails the batch.
pub fn extract_all(root: &Path, files: &[PathBuf], workers: usize) -> XrayResult<Extraction> {
    if files.is_empty() {
        return Ok(Extraction::default());
    }

    let threads = workers.clamp(1, files.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    debug!("Extracting {} files on {} workers", files.len(), threads);

    let results: Vec<Result<ParsedFile, Warning>> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                parse_file(&root.join(file)).map_err(|e| Warning::new(file, format!("{:#}", e)))
            })
            .collect()
    });

    let mut extraction = Extraction::default();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(parsed) => {
                extraction.files.push(file.clone());
                extraction.parsed.push(parsed);
            }
            Err(warning) => {
                warn!("Skipping {}: {}", warning.path, warning.message);
                extraction.warnings.push(warning);
            }
        }
    }

    Ok(extraction)
}
