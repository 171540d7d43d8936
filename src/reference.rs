//! Reference identifiers for documentation entries.
//!
//! Pattern: `[FILE:][PROC:][DS:]NAME`
//!
//! - entries that are not exported are prefixed with their file name
//! - entries declared inside a procedure or data structure other than
//!   themselves are prefixed with that procedure / data structure

use crate::model::{DocEntry, SourceFile};
use std::collections::HashMap;

/// Unique identifier for `entry` declared in the file named `file_name`.
///
/// Orphan entries have no identifier.
pub fn reference_id(entry: &DocEntry, file_name: &str) -> Option<String> {
    if entry.is_orphan() {
        return None;
    }

    let mut segments: Vec<&str> = Vec::with_capacity(4);
    if !entry.exported {
        segments.push(file_name);
    }
    let scope = &entry.scope;
    if encloses(&scope.procedure, &entry.name) {
        segments.push(&scope.procedure);
    }
    if encloses(&scope.data_structure, &entry.name) {
        segments.push(&scope.data_structure);
    }
    segments.push(&entry.name);
    Some(segments.join(":"))
}

fn encloses(scope_name: &str, name: &str) -> bool {
    !scope_name.is_empty() && !scope_name.eq_ignore_ascii_case(name)
}

/// Identifiers that more than one entry resolves to, with every file that
/// declares them, in first-seen order.
pub fn duplicates(files: &[SourceFile]) -> Vec<(String, Vec<String>)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for file in files {
        let source = file.path.display().to_string();
        for entry in &file.entries {
            let Some(id) = reference_id(entry, &file.name) else {
                continue;
            };
            match seen.get(&id) {
                Some(&ix) => groups[ix].1.push(source.clone()),
                None => {
                    seen.insert(id.clone(), groups.len());
                    groups.push((id, vec![source.clone()]));
                }
            }
        }
    }

    groups.retain(|(_, sources)| sources.len() > 1);
    groups
}
