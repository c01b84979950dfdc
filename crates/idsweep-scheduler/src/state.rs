//! Shared run state.
//!
//! Every field that workers read or write lives behind one mutex. Critical
//! sections never await, so a blocking `std::sync::Mutex` is used rather
//! than an async one.

use idsweep_types::{FetchOutcome, RunPhase, RunSummary, StopReason};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Effect of recording one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// Failure streak after this outcome.
    pub consecutive_failures: u32,
    /// True only for the one call that moved the run from running to draining.
    pub began_draining: bool,
}

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    /// Current phase.
    pub phase: RunPhase,
    /// Next id to be claimed.
    pub next_id: u64,
    /// Current failure streak.
    pub consecutive_failures: u32,
    /// Workers that have not exited yet.
    pub active_workers: usize,
    /// Completed downloads so far.
    pub completed: u64,
    /// Oversized skips so far.
    pub skipped: u64,
    /// Failures so far.
    pub failed: u64,
    /// URL of the most recently completed download.
    pub last_successful_url: Option<String>,
}

#[derive(Debug)]
struct Inner {
    next_id: u64,
    consecutive_failures: u32,
    last_successful_url: Option<String>,
    phase: RunPhase,
    stop_reason: Option<StopReason>,
    active_workers: usize,
    completed: u64,
    skipped: u64,
    failed: u64,
}

impl Inner {
    /// Leaves `Running`. Returns false if the run had already left it.
    fn begin_draining(&mut self, reason: StopReason) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        self.phase = RunPhase::Draining;
        self.stop_reason = Some(reason);
        if self.active_workers == 0 {
            self.phase = RunPhase::Stopped;
        }
        true
    }
}

/// Counters and phase shared by all workers of one run.
///
/// Phases move strictly forward: `Running → Draining → Stopped`. Ids are
/// handed out in ascending order, each exactly once, and only while running.
#[derive(Debug)]
pub struct RunState {
    start_id: u64,
    failure_threshold: u32,
    inner: Mutex<Inner>,
}

impl RunState {
    /// Creates the state for a run starting at `start_id`.
    #[must_use]
    pub fn new(start_id: u64, failure_threshold: u32) -> Self {
        Self {
            start_id,
            failure_threshold,
            inner: Mutex::new(Inner {
                next_id: start_id,
                consecutive_failures: 0,
                last_successful_url: None,
                phase: RunPhase::Running,
                stop_reason: None,
                active_workers: 0,
                completed: 0,
                skipped: 0,
                failed: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // No critical section can panic halfway, so a poisoned lock is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the next id, or `None` once the run has stopped admitting work.
    pub fn claim(&self) -> Option<u64> {
        let mut inner = self.lock();
        if inner.phase != RunPhase::Running {
            return None;
        }
        let id = inner.next_id;
        match id.checked_add(1) {
            Some(next) => {
                inner.next_id = next;
                Some(id)
            }
            None => {
                inner.begin_draining(StopReason::IdSpaceExhausted);
                None
            }
        }
    }

    /// Folds one outcome into the counters.
    ///
    /// A completion resets the streak and becomes the last success; a
    /// failure extends the streak and, on reaching the threshold, starts
    /// draining; a skip changes neither.
    pub fn record(&self, url: &str, outcome: &FetchOutcome) -> Recorded {
        let mut inner = self.lock();
        let mut began_draining = false;

        match outcome {
            FetchOutcome::Completed { .. } => {
                inner.completed += 1;
                inner.consecutive_failures = 0;
                inner.last_successful_url = Some(url.to_string());
            }
            FetchOutcome::Skipped(_) => {
                inner.skipped += 1;
            }
            FetchOutcome::Failed(_) => {
                inner.failed += 1;
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.failure_threshold {
                    began_draining = inner.begin_draining(StopReason::FailureThreshold);
                }
            }
        }

        Recorded {
            consecutive_failures: inner.consecutive_failures,
            began_draining,
        }
    }

    /// Stops admitting new work. Returns false if the run had already left `Running`.
    pub fn request_stop(&self) -> bool {
        self.lock().begin_draining(StopReason::Interrupted)
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.lock().phase
    }

    /// Returns the current failure streak.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Copies the current counters.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        let inner = self.lock();
        RunSnapshot {
            phase: inner.phase,
            next_id: inner.next_id,
            consecutive_failures: inner.consecutive_failures,
            active_workers: inner.active_workers,
            completed: inner.completed,
            skipped: inner.skipped,
            failed: inner.failed,
            last_successful_url: inner.last_successful_url.clone(),
        }
    }

    /// Builds the run summary from the current counters.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let inner = self.lock();
        RunSummary {
            start_id: self.start_id,
            next_id: inner.next_id,
            completed: inner.completed,
            skipped: inner.skipped,
            failed: inner.failed,
            consecutive_failures: inner.consecutive_failures,
            last_successful_url: inner.last_successful_url.clone(),
            stop_reason: inner.stop_reason,
        }
    }

    fn worker_started(&self) {
        self.lock().active_workers += 1;
    }

    fn worker_finished(&self) {
        let mut inner = self.lock();
        inner.active_workers = inner.active_workers.saturating_sub(1);
        if inner.active_workers == 0 && inner.phase == RunPhase::Draining {
            inner.phase = RunPhase::Stopped;
        }
    }
}

/// Occupies one worker slot for as long as it lives.
///
/// Acquired before the worker task is spawned and dropped when the task
/// ends, including by panic, so the active count never drifts.
#[derive(Debug)]
pub(crate) struct SlotGuard {
    state: Arc<RunState>,
}

impl SlotGuard {
    pub(crate) fn acquire(state: Arc<RunState>) -> Self {
        state.worker_started();
        Self { state }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.state.worker_finished();
    }
}
