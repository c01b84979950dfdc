//! Run narration.

use idsweep_types::{Candidate, ItemError, RunSummary, SkipReason, StopReason};

/// Something worth narrating during a run.
#[derive(Debug)]
pub enum SweepEvent<'a> {
    /// About to probe a candidate.
    Checking {
        /// The candidate.
        candidate: &'a Candidate,
    },
    /// Probe succeeded within the limit; fetching the body.
    Downloading {
        /// The candidate.
        candidate: &'a Candidate,
        /// Declared size in bytes.
        size: u64,
    },
    /// Body fully written.
    Downloaded {
        /// The candidate.
        candidate: &'a Candidate,
        /// Bytes written.
        bytes: u64,
    },
    /// Candidate skipped without fetching.
    Skipped {
        /// The candidate.
        candidate: &'a Candidate,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// Probe or fetch failed.
    Failed {
        /// The candidate.
        candidate: &'a Candidate,
        /// What went wrong.
        error: &'a ItemError,
        /// Failure streak including this failure.
        consecutive_failures: u32,
    },
    /// The run stopped admitting new candidates.
    Draining {
        /// What caused the drain.
        reason: StopReason,
        /// Failure streak at the moment of the transition.
        consecutive_failures: u32,
    },
}

/// Receives run narration.
///
/// Implementations must not panic and must swallow their own I/O errors;
/// reporting never influences scheduling.
pub trait Reporter: Send + Sync {
    /// Narrates one event.
    fn report(&self, event: &SweepEvent<'_>);

    /// Narrates the end of the run.
    fn summarize(&self, summary: &RunSummary);
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &SweepEvent<'_>) {
        match event {
            SweepEvent::Checking { candidate } => {
                tracing::debug!(id = candidate.id, url = %candidate.url, "Checking");
            }
            SweepEvent::Downloading { candidate, size } => {
                tracing::info!(id = candidate.id, url = %candidate.url, size, "Downloading");
            }
            SweepEvent::Downloaded { candidate, bytes } => {
                tracing::info!(
                    id = candidate.id,
                    path = %candidate.destination.display(),
                    bytes,
                    "Downloaded"
                );
            }
            SweepEvent::Skipped { candidate, reason } => {
                tracing::info!(id = candidate.id, file = %candidate.file_name(), %reason, "Skipped");
            }
            SweepEvent::Failed {
                candidate,
                error,
                consecutive_failures,
            } => {
                tracing::warn!(
                    id = candidate.id,
                    url = %candidate.url,
                    kind = %error.kind(),
                    error = %error,
                    consecutive_failures,
                    "Failed"
                );
            }
            SweepEvent::Draining {
                reason,
                consecutive_failures,
            } => {
                tracing::warn!(%reason, consecutive_failures, "No longer admitting new ids");
            }
        }
    }

    fn summarize(&self, summary: &RunSummary) {
        tracing::info!(
            consecutive_failures = summary.consecutive_failures,
            last_successful_url = summary.last_successful_url.as_deref().unwrap_or("none"),
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            next_id = summary.next_id,
            "Stopped after {} consecutive failures",
            summary.consecutive_failures
        );
    }
}
