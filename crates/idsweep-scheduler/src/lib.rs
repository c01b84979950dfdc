//! Bounded worker pool that sweeps an id range until failures pile up.
//!
//! This crate provides the run control loop:
//!
//! - [`RunState`] - Shared, synchronized counters and the run phase machine
//! - [`Sweeper`] - Spawns the workers, joins them and produces a [`RunSummary`]
//! - [`SweepHandle`] - Requests a drain from outside the pool and observes progress
//! - [`Reporter`] - Narration sink for per-item events and the final summary
//!
//! [`RunSummary`]: idsweep_types::RunSummary

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/idsweep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod reporter;
mod state;
mod sweeper;

pub use reporter::{Reporter, SweepEvent, TracingReporter};
pub use state::{Recorded, RunSnapshot, RunState};
pub use sweeper::{SweepError, SweepHandle, Sweeper};
