//! Transport abstraction used by the scheduler.

use async_trait::async_trait;
use idsweep_types::{ItemError, ProbeResult};
use std::path::Path;

/// Issues the two requests a candidate needs.
///
/// Implementations must resolve every call to an explicit result; a panic or
/// an unbounded wait stalls the worker that made the call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the declared size of the resource at `url` without fetching it.
    async fn probe(&self, url: &str) -> ProbeResult;

    /// Streams the resource at `url` into `destination`, returning bytes written.
    ///
    /// On failure no file may remain at `destination`.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, ItemError>;
}
