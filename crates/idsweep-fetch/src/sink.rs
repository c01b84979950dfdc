//! Streaming a response body to disk.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use idsweep_types::ItemError;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Writes every chunk of `body` to a new file at `destination`.
///
/// The file is flushed and synced before returning, so a caller seeing
/// `Ok` observes a complete file. If a chunk fails or a write fails, the
/// partial file is removed before the error is returned.
///
/// # Errors
///
/// Returns the first chunk error, or an I/O error from creating or writing the file.
pub async fn write_body<S>(body: S, destination: &Path) -> Result<u64, ItemError>
where
    S: Stream<Item = Result<Bytes, ItemError>>,
{
    let file = File::create(destination)
        .await
        .map_err(|e| ItemError::io(destination, e))?;

    match copy_body(body, file, destination).await {
        Ok(written) => Ok(written),
        Err(err) => {
            remove_partial(destination).await;
            Err(err)
        }
    }
}

async fn copy_body<S>(body: S, mut file: File, destination: &Path) -> Result<u64, ItemError>
where
    S: Stream<Item = Result<Bytes, ItemError>>,
{
    let mut body = std::pin::pin!(body);
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ItemError::io(destination, e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| ItemError::io(destination, e))?;
    file.sync_all()
        .await
        .map_err(|e| ItemError::io(destination, e))?;

    Ok(written)
}

/// Removes a partially written file, logging instead of failing.
///
/// A missing file is not an error.
pub async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial download");
        }
    }
}
