//! The search state machine and scan worker.
//!
//! ```text
//! UNSTARTED --start()--> SEARCHING --+--> FINISHED
//!                            |       +--> ERRORED
//!                       cancel()
//!                            v
//!                       CANCELLING ------> CANCELLED
//! ```
//!
//! `start()` readies the dictionary cache, compiles the query, and hands
//! the scan to a blocking worker; the calling task stays responsive and
//! observes the search through [`Search::status`], the shared
//! [`Progress`], and the live [`Results`]. Errors surface as the ERRORED
//! state with the error retrievable afterwards, never as a panic across
//! the worker boundary.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::cache::dictionary_cache::CacheSnapshot;
use crate::dictionary::Dictionary;
use crate::error::{JitenError, Result};
use crate::morphology::MorphologyEngine;
use crate::progress::Progress;
use crate::search::query::Query;
use crate::search::query_node::{MatchInfo, QueryNode};
use crate::search::results::{LineRef, Results, SearchIterator};

/// Lifecycle state of one [`Search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SearchStatus {
    Unstarted = 0,
    Searching = 1,
    Cancelling = 2,
    Finished = 3,
    Cancelled = 4,
    Errored = 5,
}

impl SearchStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Unstarted,
            1 => Self::Searching,
            2 => Self::Cancelling,
            3 => Self::Finished,
            4 => Self::Cancelled,
            _ => Self::Errored,
        }
    }

    /// Whether the search has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Errored)
    }
}

/// Per-search knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Match in filter-only columns as well.
    pub include_filter_columns: bool,
    /// Stop the scan once this many lines matched.
    pub max_results: Option<usize>,
}

struct SearchShared {
    status: AtomicU8,
    results: Arc<Results>,
    error: Mutex<Option<JitenError>>,
    progress: Arc<Progress>,
}

impl SearchShared {
    fn status(&self) -> SearchStatus {
        SearchStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn transition(&self, from: SearchStatus, to: SearchStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn force(&self, to: SearchStatus) {
        self.status.store(to as u8, Ordering::Release);
    }

    fn fail(&self, error: JitenError) {
        if error.is_cancelled() {
            self.force(SearchStatus::Cancelled);
            return;
        }
        tracing::warn!(error = %error, "search failed");
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
        self.progress.set_errored();
        self.force(SearchStatus::Errored);
    }

    fn cancel_requested(&self) -> bool {
        self.status() == SearchStatus::Cancelling || self.progress.is_cancelled()
    }
}

/// One in-flight search over one dictionary.
pub struct Search {
    dictionary: Arc<Dictionary>,
    query_text: String,
    options: SearchOptions,
    morphology: Arc<dyn MorphologyEngine>,
    shared: Arc<SearchShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Search {
    pub fn new(
        dictionary: Arc<Dictionary>,
        query: &str,
        morphology: Arc<dyn MorphologyEngine>,
        options: SearchOptions,
    ) -> Self {
        Self {
            dictionary,
            query_text: query.to_string(),
            options,
            morphology,
            shared: Arc::new(SearchShared {
                status: AtomicU8::new(SearchStatus::Unstarted as u8),
                results: Arc::new(Results::new()),
                error: Mutex::new(None),
                progress: Arc::new(Progress::new()),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn query(&self) -> &str {
        &self.query_text
    }

    pub fn status(&self) -> SearchStatus {
        self.shared.status()
    }

    /// The live result sequence; valid in every state.
    pub fn results(&self) -> Arc<Results> {
        Arc::clone(&self.shared.results)
    }

    pub fn iter(&self) -> SearchIterator {
        SearchIterator::new(self.results())
    }

    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.shared.progress)
    }

    /// The error that moved the search to ERRORED, if any.
    pub fn take_error(&self) -> Option<JitenError> {
        self.shared
            .error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Starts the search.
    ///
    /// Readies the dictionary cache (building it on first use), compiles
    /// the query, and spawns the scan worker. Cache-build and query
    /// failures park the search in ERRORED rather than returning an error;
    /// only calling `start` twice is an immediate error.
    pub async fn start(&self) -> Result<()> {
        if !self
            .shared
            .transition(SearchStatus::Unstarted, SearchStatus::Searching)
        {
            return Err(JitenError::InvalidState(format!(
                "search already started (status {:?})",
                self.status()
            )));
        }

        let snapshot = match self
            .dictionary
            .ensure_cache(&self.morphology, &self.shared.progress)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.shared.fail(err);
                return Ok(());
            }
        };

        let query = match Query::parse(&self.query_text, self.morphology.as_ref()) {
            Ok(query) => query,
            Err(err) => {
                self.shared.fail(err);
                return Ok(());
            }
        };

        tracing::debug!(
            dictionary = %self.dictionary.name(),
            query = %self.query_text,
            leaves = query.root().leaf_count(),
            "search started"
        );

        let shared = Arc::clone(&self.shared);
        let options = self.options;
        let root = query.into_root();
        let handle =
            tokio::task::spawn_blocking(move || scan(&snapshot, &root, options, &shared));
        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    /// Requests cooperative cancellation.
    ///
    /// The worker observes the request at its next per-line check, keeps
    /// everything already accumulated, and moves to CANCELLED.
    pub fn cancel(&self) {
        self.shared.progress.cancel_token().cancel();
        self.shared
            .transition(SearchStatus::Searching, SearchStatus::Cancelling);
    }

    /// Waits for the worker to finish and returns the terminal status.
    pub async fn wait(&self) -> SearchStatus {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(join_error) = handle.await {
                self.shared
                    .fail(JitenError::WorkerPanic(join_error.to_string()));
            }
        }
        self.status()
    }

    /// Convenience: start, wait, and surface the terminal status.
    pub async fn run(&self) -> Result<SearchStatus> {
        self.start().await?;
        Ok(self.wait().await)
    }
}

/// The scan: candidate selection, per-line evaluation, accumulation.
fn scan(
    snapshot: &CacheSnapshot,
    root: &QueryNode,
    options: SearchOptions,
    shared: &SearchShared,
) {
    let kind = snapshot.kind;
    let line_ids: Vec<u32> = match root.candidates(&snapshot.indexed, kind) {
        Some(candidates) => candidates,
        None => (0..snapshot.parsed.line_count() as u32).collect(),
    };
    let total = line_ids.len() as u64;
    shared.progress.set_totals(0, total);

    let mut matched = 0usize;
    for (scanned, line_id) in line_ids.into_iter().enumerate() {
        if shared.cancel_requested() {
            shared.force(SearchStatus::Cancelled);
            tracing::debug!(matched, scanned, "search cancelled");
            return;
        }

        let mut info = MatchInfo::default();
        if root.matches_line(
            &snapshot.parsed,
            line_id,
            kind,
            options.include_filter_columns,
            &mut info,
        ) {
            shared.results.push(LineRef {
                line: line_id,
                matches: Arc::new(info),
            });
            matched += 1;
            if options.max_results.is_some_and(|max| matched >= max) {
                break;
            }
        }
        shared.progress.set_totals(scanned as u64 + 1, total);
    }

    shared.progress.set_totals(total, total);
    shared.force(SearchStatus::Finished);
    tracing::debug!(matched, "search finished");
}
