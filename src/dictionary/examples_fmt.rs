//! Tanaka-corpus example sentence parser.
//!
//! Records come in `A:`/`B:` line pairs:
//!
//! ```text
//! A: 彼は走った。	He ran.#ID=12345
//! B: 彼(かれ)[01]{彼} は 走る{走った}
//! ```
//!
//! `A:` lines carry the Japanese sentence, a tab, and the English
//! translation with a trailing `#ID=` marker. `B:` lines carry the
//! word-level breakdown; each whitespace field becomes one breakdown
//! token. Lines with neither prefix parse to empty columns.

use crate::cache::parsed::{ParsedLine, TokenSpan};

const SENTENCE: usize = 0;
const TRANSLATION: usize = 1;
const BREAKDOWN: usize = 2;

// Prefixes and the ID marker match in either case; the parser sees
// case-folded text when case insensitivity is on.
fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &line[prefix.len()..])
}

fn find_ci(text: &str, needle: &str) -> Option<usize> {
    text.as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

pub(super) fn parse_line(line: &str, base: u32) -> ParsedLine {
    let mut out = ParsedLine::with_columns(3);

    if let Some(body) = strip_prefix_ci(line, "A:") {
        let body_start = 2 + leading_ws(body);
        let body = body.trim_start();
        match body.find('\t') {
            Some(tab) => {
                push_trimmed(&mut out, SENTENCE, &body[..tab], base, body_start);
                let after = &body[tab + 1..];
                // The #ID= suffix is corpus bookkeeping, not translation text.
                let translation = match find_ci(after, "#ID=") {
                    Some(id) => &after[..id],
                    None => after,
                };
                push_trimmed(&mut out, TRANSLATION, translation, base, body_start + tab + 1);
            }
            None => push_trimmed(&mut out, SENTENCE, body, base, body_start),
        }
    } else if let Some(body) = strip_prefix_ci(line, "B:") {
        let body_start = 2;
        let mut start = None;
        for (idx, c) in body.char_indices() {
            if c.is_whitespace() {
                if let Some(s) = start.take() {
                    out.columns[BREAKDOWN]
                        .push(span(base, body_start + s, body_start + idx));
                }
            } else if start.is_none() {
                start = Some(idx);
            }
        }
        if let Some(s) = start {
            out.columns[BREAKDOWN]
                .push(span(base, body_start + s, body_start + body.len()));
        }
    }

    out
}

fn span(base: u32, start: usize, end: usize) -> TokenSpan {
    TokenSpan::new(base + start as u32, (end - start) as u32)
}

fn leading_ws(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn push_trimmed(out: &mut ParsedLine, column: usize, text: &str, base: u32, offset: usize) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    let start = offset + (trimmed.as_ptr() as usize - text.as_ptr() as usize);
    out.columns[column].push(span(base, start, start + trimmed.len()));
}
