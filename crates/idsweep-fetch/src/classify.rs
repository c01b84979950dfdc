//! Size limit classification.

/// Decision for a probed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Size is within the limit; fetch the body.
    Proceed,
    /// Size exceeds the limit; skip without fetching.
    SkipOversized,
}

/// Decides whether a candidate of `size_bytes` should be fetched.
///
/// A size equal to the limit is still fetched.
#[must_use]
pub const fn classify(size_bytes: u64, limit: u64) -> Classification {
    if size_bytes > limit {
        Classification::SkipOversized
    } else {
        Classification::Proceed
    }
}
