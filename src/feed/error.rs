// src/feed/error.rs
use thiserror::Error;

/// Failures of a single fetch + parse step.
///
/// None of these are retried here; the coordinator keeps the previous
/// snapshot and tries again on its next tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Connection-level failure (DNS, connect, TLS, body read).
    #[error("network error while fetching alerts: {0}")]
    Transport(String),
    #[error("timed out while fetching alerts")]
    Timeout,
    /// Upstream answered with something other than 200.
    #[error("feed returned HTTP {0}")]
    UpstreamStatus(u16),
    #[error("could not parse feed XML: {0}")]
    MalformedFeed(String),
    /// Well-formed XML whose root has no `<channel>` child.
    #[error("feed is missing its <channel> element")]
    MissingChannel,
    /// The client could not be built, e.g. an unparseable feed URL.
    #[error("feed client misconfigured: {0}")]
    Config(String),
}

impl FeedError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Transport(_) => "transport",
            FeedError::Timeout => "timeout",
            FeedError::UpstreamStatus(_) => "upstream_status",
            FeedError::MalformedFeed(_) => "malformed_feed",
            FeedError::MissingChannel => "missing_channel",
            FeedError::Config(_) => "config",
        }
    }

    /// Errors that mean "the feed could not be reached", as opposed to
    /// "the feed was reached but made no sense".
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            FeedError::Transport(_) | FeedError::Timeout | FeedError::UpstreamStatus(_)
        )
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else if err.is_builder() {
            FeedError::Config(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

/// The signal handed to the coordinator when a poll cycle fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("update failed: {0}")]
pub struct UpdateFailed(#[from] pub FeedError);
