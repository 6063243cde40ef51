//! Inverted index over the parsed token table.
//!
//! The index maps normalized word tokens to posting lists of
//! (line, column) pairs. It is a prefilter, never an oracle: a query's
//! candidate set drawn from the index is a superset of the lines the full
//! regex scan would accept, and every candidate is still re-checked by the
//! scan. Both sides tokenize through the same [`MorphologyEngine`], which
//! is what makes the superset guarantee hold.
//!
//! On disk the index is one rkyv artifact. The token-to-list lookup map is
//! skipped during serialization and rebuilt after load, since archived
//! hash maps cannot be deserialized zero-copy into the borrowed keys the
//! live structure wants.

use hashbrown::HashMap;
use rkyv::with::Skip;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

use crate::cache::parsed::Parsed;
use crate::dictionary::DictionaryKind;
use crate::error::{JitenError, Result};
use crate::morphology::MorphologyEngine;
use crate::progress::Progress;

/// One occurrence of a token.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Posting {
    /// Line id, equal to the source line number.
    pub line: u32,
    /// Column id within the dictionary's schema.
    pub column: u8,
}

/// All occurrences of one token, sorted by (line, column).
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug, Clone)]
pub struct PostingList {
    pub token: String,
    pub entries: Vec<Posting>,
}

/// The inverted index for one dictionary at one normalization setting.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug, Default)]
pub struct Indexed {
    /// Posting lists sorted by token.
    postings: Vec<PostingList>,
    /// Token to postings-vector position, rebuilt after deserialization.
    #[rkyv(with = Skip)]
    lookup: HashMap<String, u32>,
}

impl Indexed {
    /// Builds the index from a parsed table.
    ///
    /// Every token of every indexed column is analyzed and all of its
    /// match-eligible variants enter the index pointing at the token's
    /// line and column. Checks for cancellation between lines.
    pub fn build(
        parsed: &Parsed,
        kind: DictionaryKind,
        morphology: &dyn MorphologyEngine,
        progress: &Progress,
    ) -> Result<Self> {
        let schema = kind.schema();
        let mut map: HashMap<String, Vec<Posting>> = HashMap::new();
        let total = parsed.line_count() as u64;

        for (line_id, line) in parsed.lines().iter().enumerate() {
            if progress.is_cancelled() {
                return Err(JitenError::Cancelled);
            }
            for (column_id, def) in schema.iter().enumerate() {
                if !def.handling.is_indexed() {
                    continue;
                }
                let posting = Posting {
                    line: line_id as u32,
                    column: column_id as u8,
                };
                for span in line.column(column_id) {
                    let text = parsed.token_text(*span);
                    for token in morphology.analyze(text) {
                        for variant in token.variants() {
                            map.entry_ref(variant).or_default().push(posting);
                        }
                    }
                }
            }
            progress.set_totals(line_id as u64 + 1, total);
        }

        let mut postings: Vec<PostingList> = map
            .into_iter()
            .map(|(token, mut entries)| {
                entries.sort_unstable();
                entries.dedup();
                PostingList { token, entries }
            })
            .collect();
        postings.sort_unstable_by(|a, b| a.token.cmp(&b.token));

        let mut index = Self {
            postings,
            lookup: HashMap::new(),
        };
        index.rebuild_lookup();
        Ok(index)
    }

    /// Restores the skipped lookup map; must run after rkyv deserialization.
    pub fn rebuild_lookup(&mut self) {
        self.lookup = self
            .postings
            .iter()
            .enumerate()
            .map(|(i, list)| (list.token.clone(), i as u32))
            .collect();
    }

    /// Posting list of an exact token, `None` when the token never occurs.
    pub fn postings(&self, token: &str) -> Option<&[Posting]> {
        self.lookup
            .get(token)
            .map(|&i| self.postings[i as usize].entries.as_slice())
    }

    /// Line ids containing any variant token, optionally restricted to one
    /// column. Sorted and deduplicated.
    pub fn candidate_lines<'a, I>(&self, variants: I, column: Option<u8>) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = Vec::new();
        for variant in variants {
            if let Some(entries) = self.postings(variant) {
                lines.extend(
                    entries
                        .iter()
                        .filter(|p| column.map_or(true, |c| p.column == c))
                        .map(|p| p.line),
                );
            }
        }
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
