//! EDICT line parser.
//!
//! Grammar of one record, as distributed in EDICT/EDICT2 files:
//!
//! ```text
//! WORD [READING] /(tag,tag) sense one/sense two/(P)/
//! ```
//!
//! The reading bracket is optional (pure-kana headwords omit it). Senses
//! are slash-delimited; leading parenthesized groups inside a sense are
//! lifted into the tags column and the remainder, when any, becomes a
//! definition token. Anything that fails to follow the shape degrades to
//! the columns that could be recognized.

use crate::cache::parsed::{ParsedLine, TokenSpan};

const WORD: usize = 0;
const READING: usize = 1;
const DEFINITION: usize = 2;
const TAGS: usize = 3;

fn span(base: u32, start: usize, end: usize) -> TokenSpan {
    TokenSpan::new(base + start as u32, (end - start) as u32)
}

pub(super) fn parse_line(line: &str, base: u32) -> ParsedLine {
    let mut out = ParsedLine::with_columns(4);

    let first_slash = line.find('/').unwrap_or(line.len());
    let word_end = line
        .find(char::is_whitespace)
        .unwrap_or(line.len())
        .min(first_slash);
    if word_end > 0 {
        out.columns[WORD].push(span(base, 0, word_end));
    }

    // Optional [reading] between the headword and the first sense. Files
    // that drop the brackets (plain word<TAB>reading lists) still get their
    // second field recognized as the reading.
    let head = &line[..first_slash];
    match head[word_end..].find('[').map(|i| i + word_end) {
        Some(open) => {
            if let Some(close) = head[open..].find(']').map(|i| i + open) {
                if close > open + 1 {
                    out.columns[READING].push(span(base, open + 1, close));
                }
            }
        }
        None => {
            let rest = &head[word_end..];
            let lead = rest.len() - rest.trim_start().len();
            let start = word_end + lead;
            let end = start
                + head[start..]
                    .find(char::is_whitespace)
                    .unwrap_or(head.len() - start);
            if start < end {
                out.columns[READING].push(span(base, start, end));
            }
        }
    }

    // Slash-delimited senses.
    let mut pos = first_slash;
    for seg in line[first_slash..].split('/') {
        let seg_start = pos;
        pos = seg_start + seg.len() + 1;

        let lead = seg.len() - seg.trim_start().len();
        let mut start = seg_start + lead;
        let end = seg_start + seg.trim_end().len();
        if start >= end {
            continue;
        }

        // Leading parenthesized groups are tags, not definition text.
        while line[start..end].starts_with('(') {
            match line[start..end].find(')') {
                Some(rel_close) => {
                    let close = start + rel_close;
                    if close > start + 1 {
                        out.columns[TAGS].push(span(base, start + 1, close));
                    }
                    start = close + 1;
                    while line[start..end].starts_with(' ') {
                        start += 1;
                    }
                }
                None => break,
            }
        }

        if start < end {
            out.columns[DEFINITION].push(span(base, start, end));
        }
    }

    out
}
