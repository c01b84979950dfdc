//! Deterministic transport and recording reporter for scheduler tests.

#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use idsweep_fetch::{Transport, write_body};
use idsweep_scheduler::{Reporter, SweepEvent};
use idsweep_types::{
    ItemError, ProbeResult, RunSummary, StopReason, SweepConfig, UrlTemplate,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub const TEMPLATE: &str = "mock://media/{id}.mp4";

/// Body written by successful scripted fetches.
pub const BODY: &str = "0123456789abcdef";

pub fn url_for(id: u64) -> String {
    TEMPLATE.replace("{id}", &id.to_string())
}

fn id_of(url: &str) -> u64 {
    url.trim_start_matches("mock://media/")
        .trim_end_matches(".mp4")
        .parse()
        .expect("mock url")
}

/// Builds a config over [`TEMPLATE`] writing into `dir`.
pub fn config(dir: &Path, start_id: u64, workers: usize, threshold: u32) -> SweepConfig {
    let mut config = SweepConfig::new(UrlTemplate::parse(TEMPLATE).unwrap());
    config.start_id = start_id;
    config.output_directory = dir.to_path_buf();
    config.max_concurrent_downloads = workers;
    config.failure_threshold = threshold;
    config
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transport,
    Timeout,
    Status(u16),
}

impl Failure {
    fn error(self) -> ItemError {
        match self {
            Self::Transport => ItemError::Transport("connection refused".to_string()),
            Self::Timeout => ItemError::Timeout,
            Self::Status(status) => ItemError::Status { status },
        }
    }
}

/// Scripted behavior for one id.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Probe reports [`BODY`]'s length and the fetch writes it.
    Complete,
    /// Probe reports `size`; a fetch, if attempted, writes [`BODY`].
    Size(u64),
    /// Probe fails.
    ProbeFails(Failure),
    /// Probe succeeds; the body stream breaks after a partial write.
    FetchFails(Failure),
}

/// Transport answering from a script, recording every call.
#[derive(Debug)]
pub struct ScriptedTransport {
    scripts: HashMap<u64, Script>,
    fallback: Script,
    delay: Option<fn(u64) -> Duration>,
    probes: Mutex<Vec<u64>>,
    fetches: Mutex<Vec<u64>>,
}

impl ScriptedTransport {
    pub fn new(fallback: Script) -> Self {
        Self {
            scripts: HashMap::new(),
            fallback,
            delay: None,
            probes: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, id: u64, script: Script) -> Self {
        self.scripts.insert(id, script);
        self
    }

    pub fn with_range(mut self, ids: std::ops::RangeInclusive<u64>, script: Script) -> Self {
        for id in ids {
            self.scripts.insert(id, script);
        }
        self
    }

    /// Delays each call by a per-id duration to shuffle completion order.
    pub fn with_delay(mut self, delay: fn(u64) -> Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn probes(&self) -> Vec<u64> {
        self.probes.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<u64> {
        self.fetches.lock().unwrap().clone()
    }

    fn script(&self, id: u64) -> Script {
        self.scripts.get(&id).copied().unwrap_or(self.fallback)
    }

    async fn pause(&self, id: u64) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay(id)).await;
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn probe(&self, url: &str) -> ProbeResult {
        let id = id_of(url);
        self.probes.lock().unwrap().push(id);
        self.pause(id).await;
        match self.script(id) {
            Script::Complete | Script::FetchFails(_) => Ok(BODY.len() as u64),
            Script::Size(size) => Ok(size),
            Script::ProbeFails(failure) => Err(failure.error()),
        }
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, ItemError> {
        let id = id_of(url);
        self.fetches.lock().unwrap().push(id);
        self.pause(id).await;
        let chunks: Vec<Result<Bytes, ItemError>> = match self.script(id) {
            Script::FetchFails(failure) => {
                vec![Ok(Bytes::from_static(b"0123")), Err(failure.error())]
            }
            _ => vec![Ok(Bytes::from_static(BODY.as_bytes()))],
        };
        write_body(stream::iter(chunks), destination).await
    }
}

/// Owned copy of a [`SweepEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Checking(u64),
    Downloading(u64),
    Downloaded(u64),
    Skipped(u64),
    Failed(u64, u32),
    Draining(StopReason, u32),
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
    summaries: Mutex<Vec<RunSummary>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<RunSummary> {
        self.summaries.lock().unwrap().clone()
    }

    /// `(id, streak)` for every failure, in report order.
    pub fn failures(&self) -> Vec<(u64, u32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Failed(id, streak) => Some((id, streak)),
                _ => None,
            })
            .collect()
    }

    pub fn drains(&self) -> Vec<(StopReason, u32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Draining(reason, streak) => Some((reason, streak)),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &SweepEvent<'_>) {
        let event = match event {
            SweepEvent::Checking { candidate } => Event::Checking(candidate.id),
            SweepEvent::Downloading { candidate, .. } => Event::Downloading(candidate.id),
            SweepEvent::Downloaded { candidate, .. } => Event::Downloaded(candidate.id),
            SweepEvent::Skipped { candidate, .. } => Event::Skipped(candidate.id),
            SweepEvent::Failed {
                candidate,
                consecutive_failures,
                ..
            } => Event::Failed(candidate.id, *consecutive_failures),
            SweepEvent::Draining {
                reason,
                consecutive_failures,
            } => Event::Draining(*reason, *consecutive_failures),
        };
        self.events.lock().unwrap().push(event);
    }

    fn summarize(&self, summary: &RunSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}
