//! Radical decomposition parser (`kradfile` layout).
//!
//! One kanji per line, a colon separator, then the radicals it is built
//! from:
//!
//! ```text
//! 個 : 人 囗 十 口
//! ```

use crate::cache::parsed::{ParsedLine, TokenSpan};

const KANJI: usize = 0;
const RADICALS: usize = 1;

pub(super) fn parse_line(line: &str, base: u32) -> ParsedLine {
    let mut out = ParsedLine::with_columns(2);

    let (head, tail, tail_offset) = match line.find(':') {
        Some(colon) => (&line[..colon], &line[colon + 1..], colon + 1),
        // No separator: treat the whole line as the kanji field.
        None => (line, "", line.len()),
    };

    if let Some((start, end)) = trimmed_range(head, 0) {
        out.columns[KANJI].push(span(base, start, end));
    }

    let mut start = None;
    for (idx, c) in tail.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.columns[RADICALS].push(span(base, tail_offset + s, tail_offset + idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        out.columns[RADICALS].push(span(base, tail_offset + s, tail_offset + tail.len()));
    }

    out
}

fn span(base: u32, start: usize, end: usize) -> TokenSpan {
    TokenSpan::new(base + start as u32, (end - start) as u32)
}

fn trimmed_range(text: &str, offset: usize) -> Option<(usize, usize)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = offset + (trimmed.as_ptr() as usize - text.as_ptr() as usize);
    Some((start, start + trimmed.len()))
}
