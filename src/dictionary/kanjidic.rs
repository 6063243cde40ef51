//! KANJIDIC line parser.
//!
//! One record per line: the kanji itself, then space-separated coded
//! fields. The codes this parser recognizes:
//!
//! ```text
//! 亜 3021 U4e9c B7 C1 G8 S7 F1509 ア つ.ぐ T1 や {Asia} {rank next}
//! ```
//!
//! - `Bn` radical number, `Gn` grade, `Sn` stroke count, `Fn` frequency
//!   rank (the digits become the column token)
//! - kana fields are readings
//! - `{...}` groups are English meanings (braces may wrap spaces)
//!
//! Everything else (JIS codes, `Uxxxx` codepoints, cross references,
//! `T1`/`T2` markers) is deliberately left out of the populated columns.

use crate::cache::parsed::{ParsedLine, TokenSpan};

const KANJI: usize = 0;
const READINGS: usize = 1;
const MEANINGS: usize = 2;
const STROKES: usize = 3;
const RADICAL: usize = 4;
const GRADE: usize = 5;
const FREQUENCY: usize = 6;

fn span(base: u32, start: usize, end: usize) -> TokenSpan {
    TokenSpan::new(base + start as u32, (end - start) as u32)
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9D}')
}

/// Reading fields may carry okurigana dots and prefix/suffix dashes.
fn is_reading(field: &str) -> bool {
    let mut has_kana = false;
    for c in field.chars() {
        if is_kana(c) {
            has_kana = true;
        } else if c != '.' && c != '-' {
            return false;
        }
    }
    has_kana
}

pub(super) fn parse_line(line: &str, base: u32) -> ParsedLine {
    let mut out = ParsedLine::with_columns(8);

    let mut fields = split_fields(line);

    if let Some((start, end)) = fields.next() {
        out.columns[KANJI].push(span(base, start, end));
    }

    for (start, end) in fields {
        let field = &line[start..end];
        if field.starts_with('{') {
            // Meaning: strip the braces, keep inner spaces.
            let inner_start = start + 1;
            let inner_end = if field.ends_with('}') { end - 1 } else { end };
            if inner_start < inner_end {
                out.columns[MEANINGS].push(span(base, inner_start, inner_end));
            }
            continue;
        }

        let mut chars = field.chars();
        let code = chars.next();
        let digits = chars.as_str();
        let numeric = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
        // Codes match in either case: the parser sees case-folded text
        // when case insensitivity is on and raw text when it is off.
        let column = match code {
            Some('S' | 's') if numeric => Some(STROKES),
            Some('B' | 'b') if numeric => Some(RADICAL),
            Some('G' | 'g') if numeric => Some(GRADE),
            Some('F' | 'f') if numeric => Some(FREQUENCY),
            _ => None,
        };
        if let Some(column) = column {
            out.columns[column].push(span(base, start + 1, end));
        } else if is_reading(field) {
            out.columns[READINGS].push(span(base, start, end));
        }
    }

    out
}

/// Splits a line into whitespace-separated fields, keeping `{...}` groups
/// together even when they contain spaces. Yields byte ranges.
fn split_fields(line: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut iter = line.char_indices().peekable();
    std::iter::from_fn(move || {
        // Skip leading whitespace.
        while matches!(iter.peek(), Some((_, c)) if c.is_whitespace()) {
            iter.next();
        }
        let (start, first) = *iter.peek()?;
        let in_braces = first == '{';
        let mut end = start;
        for (idx, c) in iter.by_ref() {
            end = idx + c.len_utf8();
            if in_braces {
                if c == '}' {
                    break;
                }
            } else if c.is_whitespace() {
                end = idx;
                break;
            }
        }
        Some((start, end))
    })
}
