//! Line-oriented, zero-copy view over a normalized dictionary buffer.
//!
//! A [`Parsed`] owns the normalized text buffer and a table of
//! [`ParsedLine`]s. Each line holds one token-span array per dictionary
//! column; spans are offsets into the shared buffer, so tokens are never
//! copied out of it. The structure is immutable after construction and is
//! rebuilt wholesale on re-parse, never patched line by line.
//!
//! For persistence the span table is flattened into plain rkyv structs
//! ([`ParsedTable`]); the buffer itself lives in its own cache artifact and
//! is rejoined with the table at load time.

use std::sync::Arc;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use smallvec::SmallVec;

use crate::error::{JitenError, Result};

/// One token's location inside the normalized buffer.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: u32,
    pub len: u32,
}

impl TokenSpan {
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    fn end(&self) -> usize {
        self.start as usize + self.len as usize
    }
}

/// Per-column token spans for one dictionary record.
///
/// The outer index is the column id from the dictionary's schema; columns
/// the parser could not populate for a malformed line are present but empty.
#[derive(Debug, Clone, Default)]
pub struct ParsedLine {
    pub columns: Vec<SmallVec<[TokenSpan; 4]>>,
}

impl ParsedLine {
    pub fn with_columns(column_count: usize) -> Self {
        Self {
            columns: vec![SmallVec::new(); column_count],
        }
    }

    /// Spans of one column, empty when the column index is out of range.
    pub fn column(&self, column: usize) -> &[TokenSpan] {
        self.columns.get(column).map(|c| c.as_slice()).unwrap_or(&[])
    }
}

/// Serializable flat form of a [`ParsedLine`].
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug, Clone)]
pub struct FlatParsedLine {
    pub columns: Vec<Vec<TokenSpan>>,
}

/// Serializable flat form of the whole line table.
///
/// This is the payload of the parsed-structure cache artifact. The buffer
/// is deliberately not part of it; the normalized-text artifact owns the
/// bytes the spans point into.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug, Clone)]
pub struct ParsedTable {
    pub lines: Vec<FlatParsedLine>,
}

/// Immutable parsed view: the normalized buffer plus its line table.
#[derive(Debug, Clone)]
pub struct Parsed {
    buffer: Arc<str>,
    lines: Vec<ParsedLine>,
}

impl Parsed {
    /// Assembles a parsed view from a buffer and its line table.
    ///
    /// Every span must lie inside the buffer on character boundaries; this
    /// is guaranteed for tables built by the in-process parsers and checked
    /// again in [`from_table`] for tables loaded from disk.
    ///
    /// [`from_table`]: Parsed::from_table
    pub fn new(buffer: Arc<str>, lines: Vec<ParsedLine>) -> Self {
        debug_assert!(lines
            .iter()
            .flat_map(|l| l.columns.iter())
            .flatten()
            .all(|s| buffer.is_char_boundary(s.start as usize)
                && buffer.is_char_boundary(s.end())));
        Self { buffer, lines }
    }

    /// Rebuilds a parsed view from a deserialized table, validating that
    /// every span points inside `buffer`.
    ///
    /// A table whose spans fall outside the buffer was written for a
    /// different normalized text and is rejected as a parse error, which
    /// cache readers treat as a miss.
    pub fn from_table(buffer: Arc<str>, table: ParsedTable) -> Result<Self> {
        let mut lines = Vec::with_capacity(table.lines.len());
        for flat in table.lines {
            let mut line = ParsedLine::default();
            for column in flat.columns {
                for span in &column {
                    let valid = span.end() <= buffer.len()
                        && buffer.is_char_boundary(span.start as usize)
                        && buffer.is_char_boundary(span.end());
                    if !valid {
                        return Err(JitenError::parse(
                            "parsed cache",
                            format!(
                                "token span {}..{} exceeds buffer of {} bytes",
                                span.start,
                                span.end(),
                                buffer.len()
                            ),
                        ));
                    }
                }
                line.columns.push(SmallVec::from_vec(column));
            }
            lines.push(line);
        }
        Ok(Self { buffer, lines })
    }

    /// Flattens the line table for serialization.
    pub fn to_table(&self) -> ParsedTable {
        ParsedTable {
            lines: self
                .lines
                .iter()
                .map(|line| FlatParsedLine {
                    columns: line.columns.iter().map(|c| c.to_vec()).collect(),
                })
                .collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, id: u32) -> Option<&ParsedLine> {
        self.lines.get(id as usize)
    }

    pub fn lines(&self) -> &[ParsedLine] {
        &self.lines
    }

    /// The normalized text a span resolves against.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Full text of one line, without its terminator.
    pub fn line_text(&self, id: u32) -> Option<&str> {
        self.buffer
            .split_inclusive('\n')
            .nth(id as usize)
            .map(|l| l.trim_end_matches(['\n', '\r']))
    }

    pub fn buffer_arc(&self) -> Arc<str> {
        Arc::clone(&self.buffer)
    }

    /// Resolves a span to its token text.
    pub fn token_text(&self, span: TokenSpan) -> &str {
        &self.buffer[span.start as usize..span.end()]
    }

    /// Joined text of one line's column, for display.
    pub fn column_text(&self, line: u32, column: usize) -> String {
        match self.line(line) {
            Some(l) => l
                .column(column)
                .iter()
                .map(|s| self.token_text(*s))
                .collect::<Vec<_>>()
                .join("; "),
            None => String::new(),
        }
    }

    /// Total number of tokens across all lines and columns.
    pub fn token_count(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.columns.iter().map(|c| c.len()).sum::<usize>())
            .sum()
    }
}
