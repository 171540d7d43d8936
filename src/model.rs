//! Data model for scanned documentation — format-agnostic.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A source file and the documentation entries found in it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File stem, used as the file segment of reference identifiers.
    pub name: String,
    pub lines: Vec<String>,
    pub entries: Vec<DocEntry>,
}

impl SourceFile {
    /// Build a source file from in-memory text. Entries are filled in by the scanner.
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let path = path.into();
        let name = file_name(&path);
        SourceFile {
            path,
            name,
            lines: text.lines().map(str::to_string).collect(),
            entries: Vec::new(),
        }
    }

    /// Read a file from disk. Bytes that are not valid UTF-8 are replaced.
    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_text(path, &String::from_utf8_lossy(&bytes)))
    }
}

/// "src/calc.rpgle" → "calc", "Makefile" → "Makefile"
fn file_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Names of the declaration blocks open at a given line.
///
/// Each category holds at most one name; an empty string means closed.
/// For the parameter interface the name is its return type spec, or `-`
/// when the interface returns nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeStack {
    pub procedure: String,
    pub data_structure: String,
    pub prototype: String,
    pub parameter_interface: String,
}

/// Kind of declaration a documentation block is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Procedure,
    DataStructure,
    Standalone,
    Constant,
    Prototype,
}

impl DeclKind {
    /// Map the suffix of a `dcl-*` keyword ("proc", "ds", ...) to a kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "proc" => Some(DeclKind::Procedure),
            "ds" => Some(DeclKind::DataStructure),
            "s" => Some(DeclKind::Standalone),
            "c" => Some(DeclKind::Constant),
            "pr" => Some(DeclKind::Prototype),
            _ => None,
        }
    }
}

/// One `/** ... */` block and the declaration it documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocEntry {
    /// Line of the opening delimiter (1-based)
    pub line: usize,
    /// Open declarations at the opening delimiter
    pub scope: ScopeStack,
    /// None when no declaration follows the block
    pub kind: Option<DeclKind>,
    /// Declared identifier, empty for orphan blocks
    pub name: String,
    pub exported: bool,
    pub short_desc: String,
    pub long_desc: String,
    pub params: Vec<ParamTag>,
    #[serde(rename = "return")]
    pub returns: ReturnTag,
    pub examples: Vec<ExampleTag>,
    pub deprecated: DeprecationTag,
    /// @see entries
    pub see: Vec<String>,
    /// Lower-cased parameter name → index into `params`, first occurrence only
    #[serde(skip)]
    param_index: HashMap<String, usize>,
}

impl DocEntry {
    pub fn new(line: usize, scope: ScopeStack) -> Self {
        DocEntry {
            line,
            scope,
            ..Default::default()
        }
    }

    /// True when the block is not bound to any declaration.
    pub fn is_orphan(&self) -> bool {
        self.name.is_empty()
    }

    /// Append a @param tag with an unknown type.
    pub fn push_param(&mut self, name: &str, desc: &str, line: usize) {
        self.param_index
            .entry(name.to_ascii_lowercase())
            .or_insert(self.params.len());
        self.params.push(ParamTag {
            name: name.to_string(),
            type_spec: None,
            line,
            desc: desc.to_string(),
        });
    }

    /// Set the type of a documented parameter from its formal declaration.
    ///
    /// Only the first formal declaration for a name counts; returns true when
    /// the type was set by this call.
    pub fn backfill_param(&mut self, name: &str, type_spec: &str, line: usize) -> bool {
        let Some(&ix) = self.param_index.get(&name.to_ascii_lowercase()) else {
            return false;
        };
        let param = &mut self.params[ix];
        if param.type_spec.is_some() {
            return false;
        }
        param.type_spec = Some(type_spec.to_string());
        param.line = line;
        true
    }
}

/// Parsed @param entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamTag {
    pub name: String,
    /// None until the formal parameter is scanned
    #[serde(rename = "type")]
    pub type_spec: Option<String>,
    /// Line of the formal parameter once back-filled, else of the @param tag
    pub line: usize,
    pub desc: String,
}

/// Parsed @return entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReturnTag {
    #[serde(rename = "type")]
    pub type_spec: Option<String>,
    pub desc: String,
}

/// Parsed @example entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExampleTag {
    pub title: Option<String>,
    /// Code lines with their original indentation
    pub lines: Vec<String>,
}

/// Parsed @deprecated entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeprecationTag {
    pub deprecated: bool,
    pub desc: String,
}
