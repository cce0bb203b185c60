// src/setup.rs
//! One-off reachability check before the service starts polling.

use thiserror::Error;

use crate::feed::fetcher::{FeedClient, SETUP_TIMEOUT};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("cannot connect to the alert feed: {0}")]
    CannotConnect(String),
    #[error("unexpected error while validating the alert feed: {0}")]
    Unknown(String),
}

impl SetupError {
    /// Short key shown to the operator, `cannot_connect` or `unknown`.
    pub fn key(&self) -> &'static str {
        match self {
            SetupError::CannotConnect(_) => "cannot_connect",
            SetupError::Unknown(_) => "unknown",
        }
    }
}

/// Build a client for `url` with the short setup timeout and probe it once.
/// The body is not read.
pub async fn validate_connection(url: &str) -> Result<(), SetupError> {
    let outcome = match FeedClient::with_url(url) {
        Ok(client) => client.with_timeout(SETUP_TIMEOUT).probe().await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(()) => {
            tracing::info!(url, "alert feed reachable");
            Ok(())
        }
        Err(err) if err.is_connectivity() => {
            tracing::warn!(url, error = %err, "alert feed unreachable");
            Err(SetupError::CannotConnect(err.to_string()))
        }
        Err(err) => {
            tracing::error!(url, error = ?err, "unexpected error during setup");
            Err(SetupError::Unknown(err.to_string()))
        }
    }
}
