//! Scope tracking for `dcl-*` / `end-*` declaration blocks.
//!
//! Runs on every line outside a documentation block. Besides opening and
//! closing scopes it back-fills parameter and return types of the entry that
//! documents the enclosing declaration.

use crate::model::{DocEntry, ScopeStack};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

// -- Regex patterns -----------------------------------------------------------

static RE_PI_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*dcl-pi[[:space:]]+(\*n|\w+)\b").unwrap());

// Return type spec: everything between the interface name and `;`
static RE_PI_RETURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[[:space:]]*dcl-pi[[:space:]]+(?:\*n|\w+)[[:space:]]+([^;]*[^;[:space:]])[[:space:]]*;")
        .unwrap()
});

static RE_PI_INLINE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bend-pi\b").unwrap());

static RE_PI_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*end-pi\b").unwrap());

static RE_DS_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*dcl-ds[[:space:]]+(\w+)").unwrap());

// Single-line structures and aliases of another structure do not open a scope
static RE_DS_SUPPRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:end-ds|likeds)\b").unwrap());

static RE_DS_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*end-ds\b").unwrap());

static RE_PR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*dcl-pr[[:space:]]+(\w+)").unwrap());

static RE_PR_SUPPRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:end-pr|likeds)\b").unwrap());

static RE_PR_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*end-pr\b").unwrap());

static RE_PROC_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*dcl-proc[[:space:]]+([^[:space:];]+)").unwrap());

static RE_PROC_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[[:space:]]*end-proc\b").unwrap());

// Formal parameter or subfield: `name type-spec;`, optionally with dcl-parm / dcl-subf
static RE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[[:space:]]*(?:dcl-(?:parm|subf)[[:space:]]+)?(\w+)[[:space:]]+([^;[:space:]][^;]*?)[[:space:]]*;")
        .unwrap()
});

/// Interface name recorded when a parameter interface has no return type.
const NO_RETURN: &str = "-";

// -- Tracking -----------------------------------------------------------------

impl ScopeStack {
    /// Advance the scope over one source line.
    ///
    /// `current` is the most recently opened documentation entry, if any.
    pub fn advance(&mut self, line: &str, line_no: usize, mut current: Option<&mut DocEntry>) {
        self.track_interface(line, line_no, current.as_deref_mut());
        self.track_data_structure(line, line_no, current.as_deref_mut());
        self.track_prototype(line, line_no, current.as_deref_mut());
        self.track_procedure(line);
    }

    fn track_interface(&mut self, line: &str, line_no: usize, current: Option<&mut DocEntry>) {
        if self.parameter_interface.is_empty() {
            if !RE_PI_OPEN.is_match(line) || RE_PI_INLINE_END.is_match(line) {
                return;
            }
            let return_type = RE_PI_RETURN
                .captures(line)
                .map(|caps| caps[1].trim().to_string());
            self.parameter_interface = return_type.clone().unwrap_or_else(|| NO_RETURN.to_string());

            if let Some(entry) = current.filter(|e| documents(e, &self.procedure)) {
                if entry.returns.type_spec.is_none() {
                    entry.returns.type_spec = return_type;
                }
            }
        } else if RE_PI_CLOSE.is_match(line) {
            self.parameter_interface.clear();
        } else if RE_PI_OPEN.is_match(line) {
            trace!(line = line_no, "parameter interface already open, header ignored");
        } else if let Some(entry) = current.filter(|e| documents(e, &self.procedure)) {
            backfill(entry, line, line_no);
        }
    }

    fn track_data_structure(&mut self, line: &str, line_no: usize, current: Option<&mut DocEntry>) {
        if self.data_structure.is_empty() {
            if let Some(caps) = RE_DS_OPEN.captures(line) {
                if !RE_DS_SUPPRESS.is_match(line) {
                    self.data_structure = caps[1].to_string();
                }
            }
        } else if RE_DS_CLOSE.is_match(line) {
            self.data_structure.clear();
        } else if RE_DS_OPEN.is_match(line) {
            trace!(line = line_no, open = %self.data_structure, "data structure already open, header ignored");
        } else if let Some(entry) = current.filter(|e| documents(e, &self.data_structure)) {
            backfill(entry, line, line_no);
        }
    }

    fn track_prototype(&mut self, line: &str, line_no: usize, current: Option<&mut DocEntry>) {
        if self.prototype.is_empty() {
            if let Some(caps) = RE_PR_OPEN.captures(line) {
                if !RE_PR_SUPPRESS.is_match(line) {
                    self.prototype = caps[1].to_string();
                }
            }
        } else if RE_PR_CLOSE.is_match(line) {
            self.prototype.clear();
        } else if RE_PR_OPEN.is_match(line) {
            trace!(line = line_no, open = %self.prototype, "prototype already open, header ignored");
        } else if let Some(entry) = current.filter(|e| documents(e, &self.prototype)) {
            backfill(entry, line, line_no);
        }
    }

    fn track_procedure(&mut self, line: &str) {
        if self.procedure.is_empty() {
            if let Some(caps) = RE_PROC_OPEN.captures(line) {
                self.procedure = caps[1].to_string();
            }
        } else if RE_PROC_CLOSE.is_match(line) {
            self.procedure.clear();
        }
    }
}

/// True when `entry` documents the declaration currently open as `scope_name`.
fn documents(entry: &DocEntry, scope_name: &str) -> bool {
    !entry.name.is_empty() && entry.name.eq_ignore_ascii_case(scope_name)
}

fn backfill(entry: &mut DocEntry, line: &str, line_no: usize) {
    if let Some(caps) = RE_FIELD.captures(line) {
        if entry.backfill_param(&caps[1], &caps[2], line_no) {
            trace!(line = line_no, param = &caps[1], entry = %entry.name, "parameter type back-filled");
        }
    }
}
