//! Candidate derivation from numeric ids.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Placeholder substituted with the candidate id.
pub const ID_PLACEHOLDER: &str = "{id}";

/// A URL template containing exactly one [`ID_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Parses a template, validating the placeholder count.
    ///
    /// # Errors
    ///
    /// Returns an error unless `{id}` occurs exactly once.
    pub fn parse(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        let found = template.matches(ID_PLACEHOLDER).count();
        if found != 1 {
            return Err(ConfigError::Placeholder { template, found });
        }
        Ok(Self(template))
    }

    /// Substitutes `id` into the template.
    ///
    /// # Example
    ///
    /// ```
    /// use idsweep_types::UrlTemplate;
    ///
    /// let template = UrlTemplate::parse("https://cdn.example.com/v/{id}.mp4").unwrap();
    /// assert_eq!(template.render(15440), "https://cdn.example.com/v/15440.mp4");
    /// ```
    #[must_use]
    pub fn render(&self, id: u64) -> String {
        self.0.replacen(ID_PLACEHOLDER, &id.to_string(), 1)
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UrlTemplate {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UrlTemplate> for String {
    fn from(template: UrlTemplate) -> Self {
        template.0
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work: an id and everything derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The numeric id.
    pub id: u64,
    /// Remote URL for this id.
    pub url: String,
    /// Local file the body is written to.
    pub destination: PathBuf,
}

impl Candidate {
    /// Returns the destination file name, for narration.
    #[must_use]
    pub fn file_name(&self) -> std::borrow::Cow<'_, str> {
        self.destination
            .file_name()
            .map_or_else(|| self.destination.to_string_lossy(), |n| n.to_string_lossy())
    }
}

/// Derives candidates deterministically from ids.
#[derive(Debug, Clone)]
pub struct CandidatePlan {
    template: UrlTemplate,
    output_dir: PathBuf,
    file_extension: String,
}

impl CandidatePlan {
    /// Creates a plan writing `{id}.{file_extension}` files into `output_dir`.
    #[must_use]
    pub fn new(
        template: UrlTemplate,
        output_dir: impl Into<PathBuf>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            template,
            output_dir: output_dir.into(),
            file_extension: file_extension.into(),
        }
    }

    /// Builds the candidate for `id`.
    #[must_use]
    pub fn candidate(&self, id: u64) -> Candidate {
        Candidate {
            id,
            url: self.template.render(id),
            destination: self
                .output_dir
                .join(format!("{id}.{}", self.file_extension)),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the URL template.
    #[must_use]
    pub const fn template(&self) -> &UrlTemplate {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_requires_single_placeholder() {
        assert!(UrlTemplate::parse("https://x/{id}.mp4").is_ok());
        assert!(matches!(
            UrlTemplate::parse("https://x/video.mp4"),
            Err(ConfigError::Placeholder { found: 0, .. })
        ));
        assert!(matches!(
            UrlTemplate::parse("https://x/{id}/{id}.mp4"),
            Err(ConfigError::Placeholder { found: 2, .. })
        ));
    }

    #[test]
    fn test_candidate_derivation() {
        let template = UrlTemplate::parse("https://host/myfiles/id/{id}.mp4").unwrap();
        let plan = CandidatePlan::new(template, "videos", "mp4");
        let candidate = plan.candidate(15440);
        assert_eq!(candidate.id, 15440);
        assert_eq!(candidate.url, "https://host/myfiles/id/15440.mp4");
        assert_eq!(candidate.destination, Path::new("videos").join("15440.mp4"));
        assert_eq!(candidate.file_name(), "15440.mp4");
    }

    #[test]
    fn test_candidate_is_deterministic() {
        let template = UrlTemplate::parse("https://host/?v={id}").unwrap();
        let plan = CandidatePlan::new(template, "out", "webm");
        assert_eq!(plan.candidate(7), plan.candidate(7));
        assert_ne!(plan.candidate(7).destination, plan.candidate(8).destination);
    }
}
