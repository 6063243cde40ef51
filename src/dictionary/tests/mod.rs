// Test module organization for the dictionary format parsers.
// Compiled only under test via #[cfg(test)] in dictionary/mod.rs.

use super::*;
use crate::cache::parsed::TokenSpan;

mod edict_tests;
mod examples_tests;
mod kanjidic_tests;
mod schema_tests;

/// Resolves a column's tokens back to text for assertion convenience.
fn column_texts<'a>(buffer: &'a str, line: &ParsedLine, column: usize) -> Vec<&'a str> {
    line.column(column)
        .iter()
        .map(|s: &TokenSpan| &buffer[s.start as usize..(s.start + s.len) as usize])
        .collect()
}

/// Parses a buffer and returns the lines alongside it.
fn parse(kind: DictionaryKind, buffer: &str) -> Vec<ParsedLine> {
    kind.parse(buffer)
}
