//! Library for sweeping sequential-id media URLs.
//!
//! This is a facade crate that re-exports functionality from the idsweep
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```no_run
//! use idsweep_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let template = UrlTemplate::parse("https://cdn.example.com/videos/{id}.mp4")?;
//!     let mut config = SweepConfig::new(template);
//!     config.start_id = 15440;
//!
//!     let summary = Sweeper::with_http(config, Arc::new(TracingReporter))?
//!         .run()
//!         .await?;
//!     println!("{}", summary.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/idsweep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use idsweep_types::*;

// Re-export transport and classification
#[cfg(feature = "fetch")]
pub use idsweep_fetch::{
    Classification, ClientConfig, HttpTransport, Transport, classify, remove_partial, write_body,
};

// Re-export the worker pool
#[cfg(feature = "scheduler")]
pub use idsweep_scheduler::{
    Recorded, Reporter, RunSnapshot, RunState, SweepError, SweepEvent, SweepHandle, Sweeper,
    TracingReporter,
};

/// Prelude module for convenient imports.
///
/// ```
/// use idsweep_lib::prelude::*;
/// ```
pub mod prelude {
    pub use idsweep_types::{
        Candidate, ConfigError, FetchOutcome, ItemError, RunSummary, SkipReason, StopReason,
        SweepConfig, UrlTemplate,
    };

    #[cfg(feature = "fetch")]
    pub use idsweep_fetch::{ClientConfig, HttpTransport, Transport};

    #[cfg(feature = "scheduler")]
    pub use idsweep_scheduler::{Reporter, SweepEvent, SweepHandle, Sweeper, TracingReporter};
}
