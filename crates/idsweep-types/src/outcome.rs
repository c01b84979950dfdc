//! Per-item outcomes and run results.

use serde::Serialize;

use crate::ItemError;

/// Why a candidate was skipped without counting as success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared size exceeds the configured limit.
    Oversized {
        /// Declared size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversized { size, .. } => write!(
                f,
                "File size {:.2} MB exceeds limit",
                *size as f64 / (1024.0 * 1024.0)
            ),
        }
    }
}

/// Result of the full probe, classify and fetch pipeline for one candidate.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Body fully written and flushed to the destination.
    Completed {
        /// Bytes written.
        bytes: u64,
    },
    /// Not fetched; neither a success nor a failure.
    Skipped(SkipReason),
    /// Probe or fetch failed.
    Failed(ItemError),
}

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// Admitting new candidates.
    #[default]
    Running,
    /// No new candidates; in-flight items are finishing.
    Draining,
    /// No workers remain. Terminal.
    Stopped,
}

impl RunPhase {
    /// Returns the phase as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What moved a run out of [`RunPhase::Running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The consecutive-failure streak reached the threshold.
    FailureThreshold,
    /// A stop was requested from outside the pool.
    Interrupted,
    /// The id counter reached `u64::MAX`.
    IdSpaceExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FailureThreshold => "failure threshold reached",
            Self::Interrupted => "interrupted",
            Self::IdSpaceExhausted => "id space exhausted",
        };
        f.write_str(s)
    }
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// First id of the run.
    pub start_id: u64,
    /// Next id that would have been claimed; ids `start_id..next_id` were all processed.
    pub next_id: u64,
    /// Completed downloads.
    pub completed: u64,
    /// Oversized skips.
    pub skipped: u64,
    /// Probe or fetch failures.
    pub failed: u64,
    /// Failure streak at the end of the run.
    pub consecutive_failures: u32,
    /// URL of the most recently completed download.
    pub last_successful_url: Option<String>,
    /// Why the run stopped admitting work.
    pub stop_reason: Option<StopReason>,
}

impl RunSummary {
    /// Number of ids claimed during the run.
    #[must_use]
    pub const fn claimed(&self) -> u64 {
        self.next_id - self.start_id
    }

    /// Serializes the summary as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
