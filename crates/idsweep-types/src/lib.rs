//! Core types for the idsweep sequential media downloader.
//!
//! This crate provides the fundamental data structures used throughout idsweep:
//!
//! - [`UrlTemplate`] - Validated URL template with a single `{id}` placeholder
//! - [`CandidatePlan`] / [`Candidate`] - Derivation of URL and destination from an id
//! - [`SweepConfig`] - Run configuration with defaults and TOML loading
//! - [`ItemError`] - Per-item failure taxonomy
//! - [`FetchOutcome`], [`RunSummary`] - Per-item and per-run results

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/idsweep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod candidate;
mod config;
mod error;
mod outcome;

pub use candidate::{Candidate, CandidatePlan, ID_PLACEHOLDER, UrlTemplate};
pub use config::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_MAX_FILE_SIZE_BYTES,
    SweepConfig,
};
pub use error::{ConfigError, ErrorKind, ItemError, ProbeResult};
pub use outcome::{FetchOutcome, RunPhase, RunSummary, SkipReason, StopReason};
