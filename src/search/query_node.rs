//! Boolean query tree and per-line evaluation.
//!
//! A compiled tree is immutable and shared by one search: leaf regexes are
//! built once, then reused across every candidate line. Evaluation is
//! two-phase. [`QueryNode::candidates`] asks the inverted index for a
//! superset of possibly-matching lines (or `None` when any branch cannot
//! be answered from the index), and [`QueryNode::matches_line`] is the
//! authoritative check that runs on every candidate regardless.

use regex::Regex;

use crate::cache::indexed::Indexed;
use crate::cache::parsed::Parsed;
use crate::dictionary::{ColumnHandling, DictionaryKind};
use crate::error::{JitenError, Result};
use crate::morphology::{MorphologyEngine, SEPARATOR_CLASS};

/// Connective of a [`QueryNode::Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Byte span of one leaf match inside the normalized buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub column: usize,
    pub start: u32,
    pub len: u32,
}

/// Positions collected by successful leaf matches during one evaluation
/// pass, shared with the result row that evaluation produced.
#[derive(Debug, Default, Clone)]
pub struct MatchInfo {
    pub spans: Vec<MatchSpan>,
}

/// One term of a query, compiled against a morphology engine.
#[derive(Debug)]
pub struct QueryLeaf {
    /// The term as written.
    pub term: String,
    /// Optional column-name constraint (`column:term`).
    pub column: Option<String>,
    /// Match-eligible normalized variants from morphology analysis.
    variants: Vec<String>,
    regex: Regex,
}

impl QueryLeaf {
    /// Compiles a term into its variant set and word-anchored regex.
    ///
    /// The regex alternates over every morphology variant and anchors on
    /// the tokenizer's separator class, so it matches exactly the lines
    /// whose token stream contains one of the variants.
    pub fn compile(
        term: &str,
        column: Option<String>,
        morphology: &dyn MorphologyEngine,
    ) -> Result<Self> {
        let mut variants: Vec<String> = Vec::new();
        for token in morphology.analyze(term) {
            for variant in token.variants() {
                if !variants.iter().any(|v| v == variant) {
                    variants.push(variant.to_string());
                }
            }
        }
        if variants.is_empty() {
            // Separator-only terms fold to their literal, which never
            // matches a token.
            variants.push(term.to_string());
        }

        let alternation = variants
            .iter()
            .map(|v| regex::escape(v))
            .collect::<Vec<_>>()
            .join("|");
        // The capture group isolates the word from its separator context.
        let pattern = format!(
            "(?:^|{sep})({alternation})(?:{sep}|$)",
            sep = SEPARATOR_CLASS
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| JitenError::parse("query", e.to_string()))?;

        Ok(Self {
            term: term.to_string(),
            column,
            variants,
            regex,
        })
    }

    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.as_str())
    }

    /// Resolves the column constraint against a schema. `Err` is an
    /// unknown column name, which matches nothing.
    fn constrained_column(&self, kind: DictionaryKind) -> std::result::Result<Option<usize>, ()> {
        match &self.column {
            Some(name) => kind.column_id(name).map(Some).ok_or(()),
            None => Ok(None),
        }
    }
}

/// One node of the boolean query expression tree.
#[derive(Debug)]
pub enum QueryNode {
    Leaf(QueryLeaf),
    Group {
        op: BoolOp,
        children: Vec<QueryNode>,
    },
}

impl QueryNode {
    /// Candidate line ids from the index, sorted and deduplicated.
    ///
    /// `None` means the index cannot answer for this subtree and the
    /// caller must scan every line. Whatever is returned is a superset of
    /// the lines [`matches_line`] accepts, never a substitute for it.
    ///
    /// [`matches_line`]: QueryNode::matches_line
    pub fn candidates(&self, indexed: &Indexed, kind: DictionaryKind) -> Option<Vec<u32>> {
        match self {
            Self::Leaf(leaf) => {
                let column = match leaf.constrained_column(kind) {
                    Ok(column) => column,
                    // Unknown column: the leaf matches nothing.
                    Err(()) => return Some(Vec::new()),
                };
                let schema = kind.schema();
                match column {
                    Some(id) => match schema[id].handling {
                        // Searched but unindexed; only a scan can answer.
                        ColumnHandling::SearchOnly => None,
                        ColumnHandling::Unused => Some(Vec::new()),
                        _ => Some(indexed.candidate_lines(leaf.variants(), Some(id as u8))),
                    },
                    None => {
                        // An unconstrained leaf may match in a search-only
                        // column the index never saw.
                        if schema
                            .iter()
                            .any(|c| matches!(c.handling, ColumnHandling::SearchOnly))
                        {
                            None
                        } else {
                            Some(indexed.candidate_lines(leaf.variants(), None))
                        }
                    }
                }
            }
            Self::Group { op, children } => match op {
                BoolOp::And => {
                    // Intersection; a child the index cannot answer
                    // constrains nothing.
                    let mut acc: Option<Vec<u32>> = None;
                    for child in children {
                        if let Some(lines) = child.candidates(indexed, kind) {
                            acc = Some(match acc {
                                None => lines,
                                Some(prev) => intersect_sorted(&prev, &lines),
                            });
                        }
                    }
                    acc
                }
                BoolOp::Or => {
                    let mut acc: Vec<u32> = Vec::new();
                    for child in children {
                        // One unanswerable child makes the union unbounded.
                        let lines = child.candidates(indexed, kind)?;
                        acc.extend(lines);
                    }
                    acc.sort_unstable();
                    acc.dedup();
                    Some(acc)
                }
            },
        }
    }

    /// Authoritative per-line evaluation.
    ///
    /// AND requires every child to match, OR at least one.
    /// `include_filter_columns` gates unconstrained leaves only: naming a
    /// column explicitly (`tags:v5k`) opts into that column regardless of
    /// its handling policy, since the constraint is already a direct
    /// request for it. A constraint naming an unknown column matches
    /// nothing. Leaf matches
    /// append their spans to `info`; a failed subtree leaves whatever its
    /// matched siblings already appended, since the row is only kept when
    /// the root matches.
    pub fn matches_line(
        &self,
        parsed: &Parsed,
        line_id: u32,
        kind: DictionaryKind,
        include_filter_columns: bool,
        info: &mut MatchInfo,
    ) -> bool {
        match self {
            Self::Leaf(leaf) => {
                let column = match leaf.constrained_column(kind) {
                    Ok(column) => column,
                    Err(()) => return false,
                };
                let Some(line) = parsed.line(line_id) else {
                    return false;
                };
                let schema = kind.schema();
                let mut matched = false;
                for (column_id, def) in schema.iter().enumerate() {
                    if let Some(only) = column {
                        if column_id != only {
                            continue;
                        }
                    } else if !def.handling.is_searched(include_filter_columns) {
                        continue;
                    }
                    for span in line.column(column_id) {
                        let text = parsed.token_text(*span);
                        for captures in leaf.regex.captures_iter(text) {
                            let Some(word) = captures.get(1) else {
                                continue;
                            };
                            matched = true;
                            info.spans.push(MatchSpan {
                                column: column_id,
                                start: span.start + word.start() as u32,
                                len: (word.end() - word.start()) as u32,
                            });
                        }
                    }
                }
                matched
            }
            Self::Group { op, children } => match op {
                BoolOp::And => children
                    .iter()
                    .all(|c| c.matches_line(parsed, line_id, kind, include_filter_columns, info)),
                BoolOp::Or => {
                    // No short-circuit: every matching branch contributes
                    // its spans.
                    let mut any = false;
                    for child in children {
                        if child.matches_line(parsed, line_id, kind, include_filter_columns, info)
                        {
                            any = true;
                        }
                    }
                    any
                }
            },
        }
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Group { children, .. } => children.iter().map(|c| c.leaf_count()).sum(),
        }
    }
}

fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
