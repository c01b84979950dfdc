//! HTTP size probing and streaming downloads for idsweep.
//!
//! This crate provides the per-item pipeline stages:
//!
//! - [`Transport`] - The probe/fetch seam the scheduler is written against
//! - [`HttpTransport`] - `reqwest` implementation with pooled connections and timeouts
//! - [`classify`] - Size limit decision between fetching and skipping
//! - [`write_body`] - Streams a body to disk, removing partial files on failure

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/idsweep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod classify;
mod client;
mod sink;
mod transport;

pub use classify::{Classification, classify};
pub use client::{ClientConfig, HttpTransport, classify_reqwest_error, content_length};
pub use sink::{remove_partial, write_body};
pub use transport::Transport;
