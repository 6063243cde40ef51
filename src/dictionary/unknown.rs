//! Fallback parser for unrecognized files: one searchable text token per
//! non-blank line.

use crate::cache::parsed::{ParsedLine, TokenSpan};

const TEXT: usize = 0;

pub(super) fn parse_line(line: &str, base: u32) -> ParsedLine {
    let mut out = ParsedLine::with_columns(1);
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        let start = trimmed.as_ptr() as usize - line.as_ptr() as usize;
        out.columns[TEXT].push(TokenSpan::new(
            base + start as u32,
            trimmed.len() as u32,
        ));
    }
    out
}
