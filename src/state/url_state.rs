/// URL lifecycle state definitions
///
/// `Unseen` is implicit: a URL with no entry in the frontier has never been seen.
use std::fmt;

/// Represents the current state of a normalized URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UrlState {
    // ===== Active States =====
    /// Waiting in the pending queue
    Enqueued,

    /// Handed to a worker; a fetch is in flight or being processed
    Fetched,

    /// The rendered fetch returned 403; a plain HTTP retry has been queued
    BlockedRetried,

    // ===== Terminal States =====
    /// Page was trusted or relevant and its record was aggregated
    Extracted,

    /// Page was fetched and its links followed, but it was neither trusted nor relevant
    Skipped,

    /// Response was not a text document; neither extracted nor mined for links
    NonText,

    /// No usable response (network error, timeout, non-success status)
    Failed,

    /// The plain HTTP retry was also blocked; the URL is abandoned
    BlockedDropped,
}

impl UrlState {
    /// Returns true if no further processing will happen for this URL
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Enqueued | Self::Fetched | Self::BlockedRetried)
    }

    /// Returns true if this represents a successful extraction
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted)
    }

    /// Returns true if this represents an error outcome
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::BlockedDropped)
    }

    /// Checks whether moving from `self` to `next` follows the lifecycle
    ///
    /// ```text
    /// Enqueued -> Fetched -> {Extracted | Skipped | NonText | Failed | BlockedRetried | BlockedDropped}
    /// BlockedRetried -> Enqueued
    /// ```
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        match self {
            Self::Enqueued => next == Self::Fetched,
            Self::Fetched => matches!(
                next,
                Self::Extracted
                    | Self::Skipped
                    | Self::NonText
                    | Self::Failed
                    | Self::BlockedRetried
                    | Self::BlockedDropped
            ),
            Self::BlockedRetried => next == Self::Enqueued,
            _ => false,
        }
    }

    /// Stable snake_case name, used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enqueued => "enqueued",
            Self::Fetched => "fetched",
            Self::BlockedRetried => "blocked_retried",
            Self::Extracted => "extracted",
            Self::Skipped => "skipped",
            Self::NonText => "non_text",
            Self::Failed => "failed",
            Self::BlockedDropped => "blocked_dropped",
        }
    }

    /// Returns all possible URL states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Enqueued,
            Self::Fetched,
            Self::BlockedRetried,
            Self::Extracted,
            Self::Skipped,
            Self::NonText,
            Self::Failed,
            Self::BlockedDropped,
        ]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
