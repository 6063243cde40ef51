// Test module organization for the search layer.
// Compiled only under test via #[cfg(test)] in search/mod.rs.

use super::*;
use crate::cache::parsed::Parsed;
use crate::dictionary::DictionaryKind;
use crate::morphology::BasicMorphology;
use std::sync::Arc;

mod engine_tests;
mod results_tests;

fn morph() -> BasicMorphology {
    BasicMorphology::default()
}

/// Parses a buffer into a [`Parsed`] without going through a cache.
fn parsed_fixture(kind: DictionaryKind, buffer: &str) -> Parsed {
    Parsed::new(Arc::from(buffer), kind.parse(buffer))
}

/// Compiles a query and evaluates it against every line of `parsed`.
fn full_scan(query: &Query, parsed: &Parsed, kind: DictionaryKind) -> Vec<u32> {
    (0..parsed.line_count() as u32)
        .filter(|&line| {
            let mut info = MatchInfo::default();
            query.root().matches_line(parsed, line, kind, false, &mut info)
        })
        .collect()
}
