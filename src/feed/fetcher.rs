// src/feed/fetcher.rs
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, Response, StatusCode, Url};

use crate::feed::error::FeedError;
use crate::feed::types::AlertSource;

pub const RSS_URL: &str = "https://www.nodvarsel.no/rss/rss-aktive-nodvarsler/";
pub const USER_AGENT: &str = "Nodvarsel-HA-Integration/1.0.0";

/// Budget for each recurring poll.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);
/// Budget for the one-off reachability check at startup.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the alert feed. One GET per call, no retries.
#[derive(Clone, Debug)]
pub struct FeedClient {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl FeedClient {
    /// Client for the public nodvarsel.no feed with the poll timeout.
    pub fn new() -> Result<Self, FeedError> {
        Self::with_url(RSS_URL)
    }

    /// Client for any feed URL. Fails with [`FeedError::Config`] if the URL
    /// does not parse or the HTTP client cannot be built.
    pub fn with_url(url: impl AsRef<str>) -> Result<Self, FeedError> {
        let url = Url::parse(url.as_ref())
            .map_err(|e| FeedError::Config(format!("invalid feed URL '{}': {e}", url.as_ref())))?;
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            url,
            timeout: POLL_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET the feed and check the status without reading the body.
    pub async fn probe(&self) -> Result<(), FeedError> {
        self.send().await.map(|_| ())
    }

    async fn send(&self) -> Result<Response, FeedError> {
        let resp = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::OK {
            tracing::debug!(target: "feed", url = %self.url, %status, "unexpected feed status");
            return Err(FeedError::UpstreamStatus(status.as_u16()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl AlertSource for FeedClient {
    async fn fetch(&self) -> Result<String, FeedError> {
        let t0 = Instant::now();
        let resp = self.send().await?;
        let body = resp.text().await?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("nodvarsel_fetch_ms").record(ms);
        tracing::debug!(target: "feed", bytes = body.len(), ms, "fetched feed");
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "nodvarsel.no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_feed() {
        let c = FeedClient::new().unwrap();
        assert_eq!(c.url(), RSS_URL);
        assert_eq!(c.timeout(), Duration::from_secs(30));
        let c = c.with_timeout(SETUP_TIMEOUT);
        assert_eq!(c.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn unparseable_url_is_config_error() {
        for url in ["http://[::1", "not a url", ""] {
            match FeedClient::with_url(url) {
                Err(FeedError::Config(msg)) => assert!(msg.contains("invalid feed URL")),
                other => panic!("expected Config error for {url:?}, got {other:?}"),
            }
        }
    }
}
