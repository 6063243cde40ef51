//! Progress reporting and cooperative cancellation.
//!
//! A [`Progress`] instance is shared between a running search (or cache
//! build) and its observer. The worker updates counters and messages; the
//! observer polls them or registers a callback. Updates are rate limited by
//! a minimum fractional delta so that a tight scan loop does not flood the
//! observer with per-line notifications.
//!
//! Cancellation is advisory: the observer flips a [`CancelToken`] and the
//! worker checks it at bounded intervals inside its loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Minimum change in completed fraction before observers are notified again.
const MIN_FRACTION_DELTA: f64 = 0.01;

/// Shared cancellation flag checked cooperatively by workers.
///
/// Cloning the token is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Observer callback invoked with the completed fraction in `0.0..=1.0`.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

/// Progress state shared between a worker and its observer.
pub struct Progress {
    current: AtomicU64,
    total: AtomicU64,
    /// Last fraction reported to the callback, stored as parts per million
    /// so the rate limiter needs no lock on the hot path.
    last_reported_ppm: AtomicU64,
    errored: AtomicBool,
    message: Mutex<String>,
    callback: Mutex<Option<ProgressCallback>>,
    cancel: CancelToken,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Creates an empty progress tracker with its own cancellation token.
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
            total: AtomicU64::new(0),
            last_reported_ppm: AtomicU64::new(0),
            errored: AtomicBool::new(false),
            message: Mutex::new(String::new()),
            callback: Mutex::new(None),
            cancel: CancelToken::new(),
        }
    }

    /// Updates the completed / total counters.
    ///
    /// The callback, when registered, is only invoked once the completed
    /// fraction has advanced by at least 1% since the previous notification,
    /// or when the work completes.
    pub fn set_totals(&self, current: u64, total: u64) {
        self.current.store(current, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);

        let fraction = if total == 0 {
            0.0
        } else {
            current as f64 / total as f64
        };
        let ppm = (fraction * 1_000_000.0) as u64;
        let last = self.last_reported_ppm.load(Ordering::Relaxed);
        let delta = ppm.abs_diff(last) as f64 / 1_000_000.0;
        let finished = total > 0 && current >= total;

        if delta >= MIN_FRACTION_DELTA || finished {
            self.last_reported_ppm.store(ppm, Ordering::Relaxed);
            let callback = self.callback.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cb) = callback.as_ref() {
                cb(fraction);
            }
        }
    }

    /// Returns the `(current, total)` counters.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.current.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    /// Returns the completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        let (current, total) = self.totals();
        if total == 0 {
            0.0
        } else {
            (current as f64 / total as f64).min(1.0)
        }
    }

    /// Sets the human-readable status message.
    pub fn set_message<S: Into<String>>(&self, message: S) {
        *self.message.lock().unwrap_or_else(|e| e.into_inner()) = message.into();
    }

    /// Returns a copy of the current status message.
    pub fn message(&self) -> String {
        self.message.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Registers the observer callback, replacing any previous one.
    pub fn set_callback(&self, callback: ProgressCallback) {
        *self.callback.lock().unwrap_or_else(|e| e.into_inner()) = Some(callback);
    }

    /// The cancellation token associated with this progress tracker.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Marks the tracked operation as errored.
    pub(crate) fn set_errored(&self) {
        self.errored.store(true, Ordering::Release);
    }

    /// Whether the tracked operation has errored.
    pub fn is_errored(&self) -> bool {
        self.errored.load(Ordering::Acquire)
    }
}
