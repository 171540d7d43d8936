//! JSON report — the hand-off format for external renderers.
//!
//! One report per source file: the raw lines for source views, and each
//! entry with its resolved reference identifier.

use crate::markers::{self, MarkerError};
use crate::model::{DocEntry, SourceFile};
use crate::reference;
use clap::ValueEnum;
use serde::Serialize;
use std::borrow::Cow;

/// How inline markers in descriptions are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarkerStyle {
    /// Leave `{@link}` / `{@code}` markers untouched
    Raw,
    /// Escape text and replace markers with HTML
    Html,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub markers: MarkerStyle,
    pub include_source: bool,
}

#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub file: String,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<&'a [String]>,
    pub entries: Vec<EntryReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct EntryReport<'a> {
    pub reference: Option<String>,
    #[serde(flatten)]
    pub entry: Cow<'a, DocEntry>,
}

/// Build the report for one scanned file.
pub fn build<'a>(file: &'a SourceFile, opts: &ReportOptions) -> Result<FileReport<'a>, MarkerError> {
    let entries = file
        .entries
        .iter()
        .map(|entry| -> Result<EntryReport<'a>, MarkerError> {
            let reference = reference::reference_id(entry, &file.name);
            let entry = match opts.markers {
                MarkerStyle::Raw => Cow::Borrowed(entry),
                MarkerStyle::Html => Cow::Owned(interpret_entry(entry)?),
            };
            Ok(EntryReport { reference, entry })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FileReport {
        file: file.path.display().to_string(),
        name: &file.name,
        lines: opts.include_source.then_some(file.lines.as_slice()),
        entries,
    })
}

/// Copy of `entry` with every description passed through the marker interpreter.
fn interpret_entry(entry: &DocEntry) -> Result<DocEntry, MarkerError> {
    let mut out = entry.clone();
    out.short_desc = markers::to_html(&entry.short_desc)?;
    out.long_desc = markers::to_html(&entry.long_desc)?;
    for param in &mut out.params {
        param.desc = markers::to_html(&param.desc)?;
    }
    out.returns.desc = markers::to_html(&entry.returns.desc)?;
    for example in &mut out.examples {
        if let Some(title) = &example.title {
            example.title = Some(markers::to_html(title)?);
        }
        example.lines = example.lines.iter().map(|line| markers::escape_html(line)).collect();
    }
    out.deprecated.desc = markers::to_html(&entry.deprecated.desc)?;
    out.see = entry
        .see
        .iter()
        .map(|see| markers::to_html(&format!("{{@link {see}}}")))
        .collect::<Result<_, _>>()?;
    Ok(out)
}

/// Pretty-printed JSON with a trailing newline.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}
