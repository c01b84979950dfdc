//! Error types for idsweep.

use std::path::PathBuf;
use thiserror::Error;

/// Result of probing a candidate: the declared size in bytes, or why it failed.
pub type ProbeResult = Result<u64, ItemError>;

/// Broad class of a per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection, DNS or timeout failure.
    Transport,
    /// Non-success status or missing/malformed metadata.
    Protocol,
    /// Local filesystem failure.
    Io,
}

impl ErrorKind {
    /// Returns the kind as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while processing a single candidate.
///
/// These never escape a worker; they are reported and folded into the run's
/// failure streak.
#[derive(Error, Debug)]
pub enum ItemError {
    /// Connection-level failure (DNS, refused, reset, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// Request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// Server returned a non-success status.
    #[error("HTTP status: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Success response without a parseable `Content-Length`.
    #[error("missing or malformed Content-Length header")]
    MissingContentLength,

    /// Writing or removing the destination file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file that was being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl ItemError {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the broad class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Timeout => ErrorKind::Transport,
            Self::Status { .. } | Self::MissingContentLength => ErrorKind::Protocol,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Errors raised while building or validating a [`crate::SweepConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// URL template does not contain exactly one `{id}` placeholder.
    #[error("URL template must contain exactly one {{id}} placeholder, found {found}: {template}")]
    Placeholder {
        /// The offending template.
        template: String,
        /// Number of placeholders found.
        found: usize,
    },

    /// No URL template was supplied.
    #[error("no URL template configured")]
    MissingTemplate,

    /// A numeric setting must be at least one.
    #[error("{name} must be at least 1")]
    Zero {
        /// Name of the setting.
        name: &'static str,
    },

    /// File extension is empty or contains a path separator.
    #[error("invalid file extension: {0:?}")]
    Extension(String),

    /// Config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
