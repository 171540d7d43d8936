//! Scan many files on a fixed-size worker pool.
//!
//! Files are independent, so each one is read and scanned on its own; the
//! results come back in input order.

use crate::model::SourceFile;
use crate::parser::{self, ScanError};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failure to produce a SourceFile for one path.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {error}", .path.display())]
    Scan { path: PathBuf, error: ScanError },
}

/// Read and scan a single file.
pub fn scan_path(path: &Path) -> Result<SourceFile, FileError> {
    let mut file = SourceFile::load(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    file.entries = parser::scan(file.lines.iter().map(String::as_str)).map_err(|error| {
        FileError::Scan {
            path: path.to_path_buf(),
            error,
        }
    })?;
    debug!(path = %path.display(), entries = file.entries.len(), "scanned");
    Ok(file)
}

/// Scan `paths` with `jobs` worker threads (0 = one per CPU).
pub fn scan_all(paths: &[PathBuf], jobs: usize) -> Result<Vec<Result<SourceFile, FileError>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("failed to start worker pool")?;
    Ok(pool.install(|| paths.par_iter().map(|p| scan_path(p)).collect()))
}
