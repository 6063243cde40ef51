//! Accumulated search results and iteration over them.
//!
//! [`Results`] is shared between the scan worker and the caller: the
//! worker appends while the caller reads, and a cancelled or errored
//! search freezes the sequence at whatever length it reached. Rows are
//! stored in scan-discovery order; [`Results::reorder`] re-sorts stably
//! without invalidating line ids already handed out, because a row is
//! identified by its line id, not by its position.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::search::query_node::MatchInfo;

/// One matched line, with the spans its query leaves matched at.
#[derive(Debug, Clone)]
pub struct LineRef {
    pub line: u32,
    pub matches: Arc<MatchInfo>,
}

/// Order-preserving, append-only match sequence.
#[derive(Debug, Default)]
pub struct Results {
    rows: Mutex<Vec<LineRef>>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, row: LineRef) {
        self.lock().push(row);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The row at a sequence position, if any.
    pub fn get(&self, position: usize) -> Option<LineRef> {
        self.lock().get(position).cloned()
    }

    /// Snapshot of the current sequence.
    pub fn rows(&self) -> Vec<LineRef> {
        self.lock().clone()
    }

    /// Stable re-sort of the accumulated rows.
    pub fn reorder<F>(&self, mut compare: F)
    where
        F: FnMut(&LineRef, &LineRef) -> Ordering,
    {
        self.lock().sort_by(|a, b| compare(a, b));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LineRef>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Forward iterator over a [`Results`] sequence.
///
/// Rows appended after the iterator was created are picked up as the
/// cursor reaches them, so iterating a live search yields matches as they
/// arrive. A per-iterator seen-set suppresses lines that multiple query
/// branches matched independently; [`rewind`] clears it.
///
/// [`rewind`]: SearchIterator::rewind
pub struct SearchIterator {
    results: Arc<Results>,
    position: usize,
    seen: HashSet<u32>,
}

impl SearchIterator {
    pub fn new(results: Arc<Results>) -> Self {
        Self {
            results,
            position: 0,
            seen: HashSet::new(),
        }
    }

    /// The next not-yet-seen row, or `None` at the current end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<LineRef> {
        loop {
            let row = self.results.get(self.position)?;
            self.position += 1;
            if self.seen.insert(row.line) {
                return Some(row);
            }
        }
    }

    /// Restarts iteration from the beginning of the sequence.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.seen.clear();
    }

    /// Whether the cursor is at the current end of the sequence.
    pub fn finished(&self) -> bool {
        self.position >= self.results.len()
    }

    /// Whether the underlying sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
