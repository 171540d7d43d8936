//! `/** ... */` documentation blocks — line-by-line state machine.
//!
//! The scanner keeps all of its state in [`Scanner`]: the open scopes, the
//! block state, the entries found so far and the index of the entry being
//! filled. Each call to [`Scanner::step`] consumes exactly one line.

use super::ScanError;
use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// -- Regex patterns -----------------------------------------------------------

static RE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*/\*\*").unwrap());

static RE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*/[[:space:]]*$").unwrap());

// Leading whitespace plus one continuation `*`
static RE_LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*\*").unwrap());

static RE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[[:space:]]*dcl-(proc|ds|s|c|pr)[[:space:]]+(\w+)").unwrap()
});

static RE_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bexport\b").unwrap());

// -- States -------------------------------------------------------------------

/// Position of the scanner relative to a documentation block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Searching for a block
    Outside,
    /// Block closed, the next non-empty line names the declaration
    AwaitingName,
    /// First content line
    ShortDesc,
    /// Further description lines
    LongDesc,
    See,
    SeeContinuation,
    Param,
    ParamContinuation,
    Return,
    Example,
    ExampleContinuation,
    Deprecated,
}

/// Tag keywords and the state each one enters.
const TAGS: &[(&str, State)] = &[
    ("@see", State::See),
    ("@param", State::Param),
    ("@return", State::Return),
    ("@example", State::Example),
    ("@deprecated", State::Deprecated),
];

// -- Scanner ------------------------------------------------------------------

/// Accumulator threaded through the lines of one file.
#[derive(Debug)]
pub struct Scanner {
    state: State,
    scope: ScopeStack,
    entries: Vec<DocEntry>,
    current: Option<usize>,
}

impl Default for Scanner {
    fn default() -> Self {
        Scanner {
            state: State::Outside,
            scope: ScopeStack::default(),
            entries: Vec::new(),
            current: None,
        }
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> State {
        self.state
    }

    #[cfg(test)]
    pub fn scope(&self) -> &ScopeStack {
        &self.scope
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[DocEntry] {
        &self.entries
    }

    /// Consume the scanner and return the entries in source order.
    pub fn finish(self) -> Vec<DocEntry> {
        if self.state == State::AwaitingName {
            self.log_orphan();
        }
        self.entries
    }

    /// Process one line. `line_no` is 1-based.
    pub fn step(&mut self, line_no: usize, line: &str) -> Result<(), ScanError> {
        if line.is_empty() {
            if self.state == State::ExampleContinuation {
                self.push_example_line("");
            }
            return Ok(());
        }

        if self.state == State::AwaitingName {
            self.bind_declaration(line);
            self.state = State::Outside;
            // Fall through: the declaration line also drives the scope
        }

        if self.state == State::Outside {
            return self.outside(line_no, line);
        }

        if let Some(body) = strip_close(line) {
            let body = strip_leader(body);
            if !is_blank(body) {
                self.content(line_no, body)?;
            }
            self.close_block();
            return Ok(());
        }

        self.content(line_no, strip_leader(line))
    }

    fn current_entry(&mut self) -> Option<&mut DocEntry> {
        match self.current {
            Some(ix) => self.entries.get_mut(ix),
            None => None,
        }
    }

    fn outside(&mut self, line_no: usize, line: &str) -> Result<(), ScanError> {
        let current = match self.current {
            Some(ix) => self.entries.get_mut(ix),
            None => None,
        };
        self.scope.advance(line, line_no, current);

        let Some(m) = RE_OPEN.find(line) else {
            return Ok(());
        };

        self.entries.push(DocEntry::new(line_no, self.scope.clone()));
        self.current = Some(self.entries.len() - 1);
        self.state = State::ShortDesc;

        // The closing `*/` may share the last `*` of the opener, as in `/**/`
        let tail = &line[m.end() - 1..];
        match strip_close(tail) {
            Some(body) => {
                let body = body.trim_start_matches('*');
                if !is_blank(body) {
                    self.content(line_no, body)?;
                }
                self.close_block();
            }
            // Text on the opening line, minus the rest of a `/*****` banner
            None => self.content(line_no, tail.trim_start_matches('*'))?,
        }
        Ok(())
    }

    fn close_block(&mut self) {
        self.state = State::AwaitingName;
    }

    /// Bind the entry to the declaration on `line`, if there is one.
    fn bind_declaration(&mut self, line: &str) {
        let caps = RE_DECL.captures(line);
        let exported = RE_EXPORT.is_match(line);
        let Some(entry) = self.current_entry() else {
            return;
        };
        entry.exported = exported;
        match caps {
            Some(caps) => {
                entry.kind = DeclKind::from_keyword(&caps[1]);
                entry.name = caps[2].to_string();
            }
            None => {
                entry.kind = None;
                entry.name.clear();
                self.log_orphan();
            }
        }
    }

    fn log_orphan(&self) {
        if let Some(entry) = self.current.and_then(|ix| self.entries.get(ix)) {
            if entry.is_orphan() {
                debug!(line = entry.line, "documentation block is not followed by a declaration");
            }
        }
    }

    /// Process a content line whose comment leader is already removed.
    ///
    /// `raw` keeps its indentation for example code; everything else works on
    /// the trimmed text.
    fn content(&mut self, line_no: usize, raw: &str) -> Result<(), ScanError> {
        let mut text = raw.trim();

        if text.starts_with('@') {
            let Some((state, rest)) = match_tag(text) else {
                let tag = text.split_whitespace().next().unwrap_or(text);
                return Err(ScanError::UnknownTag {
                    tag: tag.to_string(),
                    line: line_no,
                });
            };
            self.state = state;
            text = rest.trim();
        } else if self.state == State::ExampleContinuation {
            self.push_example_line(raw);
            return Ok(());
        } else if is_blank(text) {
            // Decorative rows of asterisks carry no text
            text = "";
        }

        let state = self.state;
        let Some(entry) = self.current_entry() else {
            return Ok(());
        };

        let next = match state {
            State::ShortDesc => {
                if text.is_empty() {
                    State::ShortDesc
                } else {
                    entry.short_desc = text.to_string();
                    State::LongDesc
                }
            }
            State::LongDesc => {
                join(&mut entry.long_desc, text);
                State::LongDesc
            }
            State::See => {
                entry.see.push(text.to_string());
                State::SeeContinuation
            }
            State::SeeContinuation => {
                if let Some(last) = entry.see.last_mut() {
                    join(last, text);
                }
                State::SeeContinuation
            }
            // A bare `@param` takes its name from the next content line
            State::Param if text.is_empty() => State::Param,
            State::Param => {
                let (name, desc) = split_first_word(text);
                entry.push_param(name, desc, line_no);
                State::ParamContinuation
            }
            State::ParamContinuation => {
                if let Some(last) = entry.params.last_mut() {
                    join(&mut last.desc, text);
                }
                State::ParamContinuation
            }
            State::Return => {
                join(&mut entry.returns.desc, text);
                State::Return
            }
            State::Example => {
                entry.examples.push(ExampleTag {
                    title: (!text.is_empty()).then(|| text.to_string()),
                    lines: Vec::new(),
                });
                State::ExampleContinuation
            }
            State::Deprecated => {
                entry.deprecated.deprecated = true;
                join(&mut entry.deprecated.desc, text);
                State::Deprecated
            }
            // Tag lines never leave these states; content only arrives inside a block
            State::ExampleContinuation | State::Outside | State::AwaitingName => state,
        };
        self.state = next;
        Ok(())
    }

    fn push_example_line(&mut self, raw: &str) {
        if let Some(example) = self.current_entry().and_then(|e| e.examples.last_mut()) {
            example.lines.push(raw.to_string());
        }
    }
}

// -- Helper functions ---------------------------------------------------------

/// Match a tag keyword at the start of `text`. The keyword must be followed by
/// a blank or the end of the line, so `@seeAlso` is not `@see`.
fn match_tag(text: &str) -> Option<(State, &str)> {
    TAGS.iter().find_map(|&(keyword, state)| {
        let rest = text.strip_prefix(keyword)?;
        (rest.is_empty() || rest.starts_with([' ', '\t'])).then_some((state, rest))
    })
}

/// Text before a closing `*/`, if the line ends the block.
fn strip_close(line: &str) -> Option<&str> {
    RE_CLOSE.find(line).map(|m| &line[..m.start()])
}

/// Remove leading whitespace and one `*` continuation marker.
fn strip_leader(line: &str) -> &str {
    match RE_LEADER.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// True for text with nothing but whitespace and asterisks.
fn is_blank(text: &str) -> bool {
    text.trim().chars().all(|c| c == '*')
}

/// "x the x value" → ("x", "the x value")
fn split_first_word(text: &str) -> (&str, &str) {
    match text.find([' ', '\t']) {
        Some(pos) => (&text[..pos], text[pos..].trim()),
        None => (text, ""),
    }
}

/// Append `text` to `dest`, separated by a single space.
fn join(dest: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !dest.is_empty() {
        dest.push(' ');
    }
    dest.push_str(text);
}
