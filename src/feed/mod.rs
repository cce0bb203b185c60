// src/feed/mod.rs
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod snapshot;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::feed::error::{FeedError, UpdateFailed};
use crate::feed::snapshot::FeedSnapshot;
use crate::feed::types::AlertSource;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("nodvarsel_polls_total", "Completed poll cycles.");
        describe_counter!(
            "nodvarsel_poll_errors_total",
            "Failed poll cycles, labelled by error kind."
        );
        describe_histogram!("nodvarsel_fetch_ms", "Feed download time in milliseconds.");
        describe_histogram!("nodvarsel_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "nodvarsel_active_alerts",
            "Alert count from the last successful poll."
        );
        describe_gauge!(
            "nodvarsel_last_success_ts",
            "Unix ts of the last successful poll."
        );
        describe_gauge!(
            "nodvarsel_scan_interval_seconds",
            "Configured poll interval."
        );
    });
}

/// Run one poll cycle: fetch, parse, summarize.
///
/// Nothing is retried; the error carries the cause for the caller to log.
pub async fn poll(source: &dyn AlertSource) -> Result<FeedSnapshot, UpdateFailed> {
    ensure_metrics_described();
    counter!("nodvarsel_polls_total").increment(1);

    let result = async {
        let body = source.fetch().await?;
        let records = parser::parse_feed(&body)?;
        Ok::<_, FeedError>(snapshot::build(records))
    }
    .await;

    match result {
        Ok(snap) => {
            gauge!("nodvarsel_active_alerts").set(snap.alert_count as f64);
            gauge!("nodvarsel_last_success_ts").set(chrono::Utc::now().timestamp() as f64);
            tracing::debug!(
                target: "feed",
                source = source.name(),
                alerts = snap.alert_count,
                "poll ok"
            );
            Ok(snap)
        }
        Err(err) => {
            let err = UpdateFailed(err);
            counter!("nodvarsel_poll_errors_total", "kind" => err.0.kind()).increment(1);
            Err(err)
        }
    }
}
