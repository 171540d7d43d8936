//! Parser module — scope tracking and documentation block scanning.

pub mod docblock;
pub mod scope;

use crate::model::{DocEntry, SourceFile};
use docblock::Scanner;
use std::path::Path;
use thiserror::Error;

/// Fatal condition that aborts the scan of a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("line {line}: {tag}: unknown tag")]
    UnknownTag { tag: String, line: usize },
}

/// Scan lines in order and return the documentation entries found.
pub fn scan<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<DocEntry>, ScanError> {
    let mut scanner = Scanner::new();
    for (ix, line) in lines.into_iter().enumerate() {
        scanner.step(ix + 1, line)?;
    }
    Ok(scanner.finish())
}

/// Parse source text into a SourceFile with its entries filled in.
pub fn parse_source(path: &Path, content: &str) -> Result<SourceFile, ScanError> {
    let mut file = SourceFile::from_text(path, content);
    file.entries = scan(file.lines.iter().map(String::as_str))?;
    Ok(file)
}
