//! The worker pool.
//!
//! A run spawns exactly `max_concurrent_downloads` workers. Each worker loops:
//! claim the next id, probe, classify, fetch or skip, record the outcome, and
//! claim again, until the run stops admitting work. Workers never wait for a
//! batch boundary, so the pool stays saturated while running.

use idsweep_fetch::{Classification, ClientConfig, HttpTransport, Transport, classify};
use idsweep_types::{
    Candidate, CandidatePlan, ConfigError, FetchOutcome, RunSummary, SkipReason, SweepConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::state::SlotGuard;
use crate::{Recorded, Reporter, RunSnapshot, RunState, SweepEvent};

/// Errors that abort a run before any candidate is processed.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Everything a worker needs, shared by all workers of a run.
struct WorkerContext {
    plan: CandidatePlan,
    max_file_size_bytes: u64,
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn Reporter>,
    state: Arc<RunState>,
}

/// Sweeps ascending ids with a fixed number of workers until the failure
/// streak reaches the configured threshold.
///
/// # Example
///
/// ```no_run
/// use idsweep_scheduler::{Sweeper, TracingReporter};
/// use idsweep_types::{SweepConfig, UrlTemplate};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = SweepConfig::new(UrlTemplate::parse("https://cdn.example.com/{id}.mp4")?);
/// config.start_id = 15440;
///
/// let summary = Sweeper::with_http(config, Arc::new(TracingReporter))?.run().await?;
/// println!("last success: {:?}", summary.last_successful_url);
/// # Ok(())
/// # }
/// ```
pub struct Sweeper {
    config: SweepConfig,
    plan: CandidatePlan,
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn Reporter>,
    state: Arc<RunState>,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Sweeper {
    /// Creates a sweeper over the given transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: SweepConfig,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, SweepError> {
        let plan = config.plan()?;
        let state = Arc::new(RunState::new(config.start_id, config.failure_threshold));
        Ok(Self {
            config,
            plan,
            transport,
            reporter,
            state,
        })
    }

    /// Creates a sweeper using [`HttpTransport`] configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn with_http(config: SweepConfig, reporter: Arc<dyn Reporter>) -> Result<Self, SweepError> {
        config.validate()?;
        let transport = HttpTransport::new(ClientConfig::from_sweep(&config))
            .map_err(|e| SweepError::Client(e.to_string()))?;
        Self::new(config, Arc::new(transport), reporter)
    }

    /// Returns a handle for observing or stopping the run.
    #[must_use]
    pub fn handle(&self) -> SweepHandle {
        SweepHandle {
            state: Arc::clone(&self.state),
            reporter: Arc::clone(&self.reporter),
        }
    }

    /// Runs until the pool has drained and returns the summary.
    ///
    /// The output directory is created first; that is the only failure that
    /// aborts the run. Per-item failures are reported and counted instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created.
    pub async fn run(self) -> Result<RunSummary, SweepError> {
        let output_dir = self.plan.output_dir().to_path_buf();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| SweepError::CreateOutputDir {
                path: output_dir.clone(),
                source,
            })?;

        tracing::info!(
            start_id = self.config.start_id,
            template = %self.plan.template(),
            output_dir = %output_dir.display(),
            workers = self.config.max_concurrent_downloads,
            failure_threshold = self.config.failure_threshold,
            "Starting sweep"
        );

        let ctx = Arc::new(WorkerContext {
            plan: self.plan,
            max_file_size_bytes: self.config.max_file_size_bytes,
            transport: self.transport,
            reporter: Arc::clone(&self.reporter),
            state: Arc::clone(&self.state),
        });

        let mut workers = JoinSet::new();
        for slot in 0..self.config.max_concurrent_downloads {
            // Taken before spawning so the pool cannot look empty while workers start
            let guard = SlotGuard::acquire(Arc::clone(&self.state));
            let ctx = Arc::clone(&ctx);
            workers.spawn(async move { run_worker(slot, &ctx, guard).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker task ended abnormally");
            }
        }

        let summary = self.state.summary();
        tracing::debug!(phase = %self.state.phase(), "All workers joined");
        self.reporter.summarize(&summary);
        Ok(summary)
    }
}

/// Cloneable handle to a run.
#[derive(Clone)]
pub struct SweepHandle {
    state: Arc<RunState>,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for SweepHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepHandle")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SweepHandle {
    /// Stops admitting new ids; in-flight items still finish and are recorded.
    ///
    /// Returns false if the run had already stopped admitting work.
    pub fn request_stop(&self) -> bool {
        let began = self.state.request_stop();
        if began {
            self.reporter.report(&SweepEvent::Draining {
                reason: idsweep_types::StopReason::Interrupted,
                consecutive_failures: self.state.consecutive_failures(),
            });
        }
        began
    }

    /// Copies the current run counters.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.snapshot()
    }
}

async fn run_worker(slot: usize, ctx: &WorkerContext, _guard: SlotGuard) {
    tracing::debug!(slot, "Worker started");

    while let Some(id) = ctx.state.claim() {
        let candidate = ctx.plan.candidate(id);
        let outcome = process_candidate(ctx, &candidate).await;
        let recorded = ctx.state.record(&candidate.url, &outcome);
        report_outcome(ctx.reporter.as_ref(), &candidate, &outcome, recorded);
    }

    tracing::debug!(slot, "Worker exiting");
}

/// Runs probe, classify and fetch for one candidate. Never fails; errors
/// become [`FetchOutcome::Failed`].
async fn process_candidate(ctx: &WorkerContext, candidate: &Candidate) -> FetchOutcome {
    ctx.reporter.report(&SweepEvent::Checking { candidate });

    let size = match ctx.transport.probe(&candidate.url).await {
        Ok(size) => size,
        Err(error) => return FetchOutcome::Failed(error),
    };

    match classify(size, ctx.max_file_size_bytes) {
        Classification::SkipOversized => FetchOutcome::Skipped(SkipReason::Oversized {
            size,
            limit: ctx.max_file_size_bytes,
        }),
        Classification::Proceed => {
            ctx.reporter
                .report(&SweepEvent::Downloading { candidate, size });
            match ctx
                .transport
                .fetch(&candidate.url, &candidate.destination)
                .await
            {
                Ok(bytes) => FetchOutcome::Completed { bytes },
                Err(error) => FetchOutcome::Failed(error),
            }
        }
    }
}

fn report_outcome(
    reporter: &dyn Reporter,
    candidate: &Candidate,
    outcome: &FetchOutcome,
    recorded: Recorded,
) {
    match outcome {
        FetchOutcome::Completed { bytes } => reporter.report(&SweepEvent::Downloaded {
            candidate,
            bytes: *bytes,
        }),
        FetchOutcome::Skipped(reason) => reporter.report(&SweepEvent::Skipped {
            candidate,
            reason: *reason,
        }),
        FetchOutcome::Failed(error) => reporter.report(&SweepEvent::Failed {
            candidate,
            error,
            consecutive_failures: recorded.consecutive_failures,
        }),
    }

    if recorded.began_draining {
        reporter.report(&SweepEvent::Draining {
            reason: idsweep_types::StopReason::FailureThreshold,
            consecutive_failures: recorded.consecutive_failures,
        });
    }
}
