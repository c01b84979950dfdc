//! Run configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CandidatePlan, ConfigError, UrlTemplate};

/// Default number of workers.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 5;

/// Default size limit (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Default consecutive-failure count that ends a run.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 80;

/// Configuration for one sweep over an id range.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// start_id = 15440
/// url_template = "https://cdn.example.com/videos/{id}.mp4"
/// output_directory = "videos"
/// failure_threshold = 40
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// First id to try.
    pub start_id: u64,
    /// Template the id is substituted into.
    pub url_template: Option<UrlTemplate>,
    /// Directory downloads are written to.
    pub output_directory: PathBuf,
    /// Number of concurrent workers.
    pub max_concurrent_downloads: usize,
    /// Files with a larger declared size are skipped.
    pub max_file_size_bytes: u64,
    /// Consecutive failures after which no new ids are admitted.
    pub failure_threshold: u32,
    /// Extension of the written files, without the dot.
    pub file_extension: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_id: 1,
            url_template: None,
            output_directory: PathBuf::from("videos"),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            file_extension: "mp4".to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

impl SweepConfig {
    /// Creates a default configuration for the given template.
    #[must_use]
    pub fn new(url_template: UrlTemplate) -> Self {
        Self {
            url_template: Some(url_template),
            ..Default::default()
        }
    }

    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a template is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    /// Checks that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_template.is_none() {
            return Err(ConfigError::MissingTemplate);
        }
        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::Zero {
                name: "max_concurrent_downloads",
            });
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::Zero {
                name: "failure_threshold",
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                name: "request_timeout_secs",
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                name: "connect_timeout_secs",
            });
        }
        if self.file_extension.is_empty()
            || self.file_extension.contains(['/', '\\'])
            || self.file_extension.starts_with('.')
        {
            return Err(ConfigError::Extension(self.file_extension.clone()));
        }
        Ok(())
    }

    /// Validates the configuration and builds its candidate plan.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Self::validate`] fails.
    pub fn plan(&self) -> Result<CandidatePlan, ConfigError> {
        self.validate()?;
        let template = self
            .url_template
            .clone()
            .ok_or(ConfigError::MissingTemplate)?;
        Ok(CandidatePlan::new(
            template,
            &self.output_directory,
            &self.file_extension,
        ))
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
