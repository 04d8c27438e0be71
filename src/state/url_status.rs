/// Lifecycle and priority definitions for admitted URLs
use serde::Serialize;
use std::fmt;

/// Represents where a URL is in its lifecycle
///
/// ```text
/// Pending -> Processing -> Completed
///                       -> Pending   (retry)
///                       -> Failed    (retries exhausted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    /// Admitted and waiting to be selected
    Pending,

    /// Selected by `next_batch`, fetch outcome not yet reported
    Processing,

    // ===== Terminal States =====
    /// Fetched successfully
    Completed,

    /// Retry budget exhausted
    Failed,
}

impl UrlStatus {
    /// Returns true if the record will never be scheduled again on its own
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if a fetch outcome may still be reported for this record
    pub fn accepts_result(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheduling priority; lower sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Seeds and explicitly requested pages
    High = 1,

    #[default]
    Medium = 2,

    /// Links discovered while crawling
    Low = 3,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
