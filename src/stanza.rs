//! Indentation-scoped stanza editing.
//!
//! Generated router configurations are treated as a sequence of stanzas: a
//! flush header line (`router bgp 100`) followed by blank, indented or `!`
//! continuation lines. This module splices new directives into the first
//! stanza matching a header keyword without rewriting or reordering any
//! existing line. It performs no idempotency checks of its own; callers must
//! pre-check for semantically equivalent lines before inserting.

use crate::store::{ArtifactStore, StoreError};
use std::path::Path;

/// Indentation applied to lines inserted inside a stanza
const BLOCK_INDENT: &str = "    ";

/// Structural classification of a single configuration line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Empty or whitespace-only
    Blank,
    /// Starts with a space or tab; body of the enclosing stanza
    Indented,
    /// Flush `!` comment line, tolerated inside a stanza
    Continuation,
    /// Any other flush line; terminates the current stanza
    Flush,
}

/// Classify a line for block-boundary scanning.
pub fn classify_line(line: &str) -> LineClass {
    if line.trim().is_empty() {
        LineClass::Blank
    } else if line.starts_with(' ') || line.starts_with('\t') {
        LineClass::Indented
    } else if line.starts_with('!') {
        LineClass::Continuation
    } else {
        LineClass::Flush
    }
}

/// Splice `lines` into the first stanza whose header starts with `header`.
///
/// The lines are indented to nest inside the block and inserted immediately
/// before the block's end: the first following line that is neither blank,
/// indented nor a continuation marker. When no stanza matches, the lines are
/// appended at document end after a separating blank line; that fallback
/// never fails.
pub fn splice_into_block(document: &str, header: &str, lines: &[String]) -> String {
    let mut doc_lines: Vec<String> = document.lines().map(str::to_string).collect();

    match doc_lines
        .iter()
        .position(|line| line.trim_start().starts_with(header))
    {
        Some(header_idx) => {
            let mut end = header_idx + 1;
            while end < doc_lines.len() {
                match classify_line(&doc_lines[end]) {
                    LineClass::Blank | LineClass::Indented | LineClass::Continuation => end += 1,
                    LineClass::Flush => break,
                }
            }
            let indented = lines.iter().map(|line| format!("{}{}", BLOCK_INDENT, line));
            doc_lines.splice(end..end, indented);
        }
        None => {
            doc_lines.push(String::new());
            doc_lines.extend(lines.iter().cloned());
        }
    }

    let mut result = doc_lines.join("\n");
    result.push('\n');
    result
}

/// Read a stored document, splice into it and write the result back.
///
/// An unreadable document is reported as a failure with no write performed,
/// so a failed mutation never leaves a partially edited artifact behind.
pub fn splice_into_document<S: ArtifactStore + ?Sized>(
    store: &mut S,
    path: &Path,
    header: &str,
    lines: &[String],
) -> Result<(), StoreError> {
    let document = store.read(path)?;
    let updated = splice_into_block(&document, header, lines);
    store.write(path, &updated)
}
