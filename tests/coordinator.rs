// tests/coordinator.rs
//
// Coordinator semantics: last-good caching, failure reporting, single
// flight, change notification and the timer loop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedSource, EMPTY_FEED, FIXTURE};
use nodvarsel_monitor::{Coordinator, FeedError};

#[tokio::test]
async fn failure_keeps_previous_snapshot() {
    let src = Arc::new(ScriptedSource::new(vec![
        Ok(FIXTURE.to_string()),
        Err(FeedError::UpstreamStatus(502)),
        Ok(EMPTY_FEED.to_string()),
    ]));
    let c = Coordinator::new(src.clone(), 90).unwrap();

    let first = c.refresh().await.expect("first poll ok");
    assert_eq!(first.alert_count, 3);

    let err = c.refresh().await.unwrap_err();
    assert_eq!(err.0, FeedError::UpstreamStatus(502));

    let status = c.status();
    assert!(!status.last_update_success);
    assert_eq!(
        status.last_error.as_deref(),
        Some("update failed: feed returned HTTP 502")
    );
    // cached data is untouched
    assert_eq!(c.snapshot().unwrap().alert_count, 3);
    assert_eq!(status.polls_completed, 2);

    // recovery replaces the snapshot wholesale and clears the error
    let third = c.refresh().await.unwrap();
    assert_eq!(third.alert_count, 0);
    let status = c.status();
    assert!(status.last_update_success);
    assert!(status.last_error.is_none());
    assert!(!c.snapshot().unwrap().has_active_alert);
    assert_eq!(src.calls(), 3);
}

#[tokio::test]
async fn failure_before_any_success_leaves_no_data() {
    let src = Arc::new(ScriptedSource::new(vec![Ok("<rss></rss>".into())]));
    let c = Coordinator::new(src, 90).unwrap();

    let err = c.first_refresh().await.unwrap_err();
    assert_eq!(err.0, FeedError::MissingChannel);
    assert!(c.snapshot().is_none());
    assert!(c.status().last_success_at.is_none());
    assert!(c.status().last_attempt_at.is_some());
}

#[tokio::test]
async fn concurrent_refreshes_share_one_fetch() {
    let src = Arc::new(
        ScriptedSource::new(vec![Ok(FIXTURE.to_string())]).with_delay(Duration::from_millis(200)),
    );
    let c = Coordinator::new(src.clone(), 90).unwrap();

    let (a, b) = tokio::join!(c.refresh(), c.refresh());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b), "both callers see the same snapshot");
    assert_eq!(src.calls(), 1);
    assert_eq!(c.status().polls_completed, 1);
}

#[tokio::test]
async fn subscribers_are_notified_on_every_poll() {
    let src = Arc::new(ScriptedSource::new(vec![
        Ok(EMPTY_FEED.to_string()),
        Err(FeedError::Timeout),
    ]));
    let c = Coordinator::new(src, 90).unwrap();
    let mut rx = c.subscribe();

    let _ = c.refresh().await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), 1);

    let _ = c.refresh().await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), 2);
}

#[tokio::test(start_paused = true)]
async fn timer_polls_on_interval() {
    let src = Arc::new(ScriptedSource::new(vec![Ok(EMPTY_FEED.to_string())]));
    let c = Coordinator::new(src.clone(), 30).unwrap();
    let mut rx = c.subscribe();

    let handle = c.spawn();
    rx.changed().await.unwrap();
    rx.changed().await.unwrap();
    handle.abort();

    assert_eq!(src.calls(), 2);
    assert!(c.status().last_update_success);
}

#[tokio::test]
async fn interval_change_triggers_immediate_refresh() {
    let src = Arc::new(ScriptedSource::new(vec![Ok(FIXTURE.to_string())]));
    let c = Coordinator::new(src.clone(), 600).unwrap();
    let mut rx = c.subscribe();

    let handle = c.spawn();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(src.calls(), 0, "nothing polls before the first interval");

    c.set_scan_interval(30).unwrap();
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("refresh after interval change")
        .unwrap();
    handle.abort();

    assert_eq!(src.calls(), 1);
    assert_eq!(c.scan_interval(), 30);
    assert_eq!(c.status().scan_interval, 30);
}

#[tokio::test]
async fn invalid_interval_is_rejected_without_waking_the_timer() {
    let src = Arc::new(ScriptedSource::new(vec![Ok(EMPTY_FEED.to_string())]));
    let c = Coordinator::new(src.clone(), 600).unwrap();
    let handle = c.spawn();

    assert!(c.set_scan_interval(10).is_err());
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.abort();

    assert_eq!(c.scan_interval(), 600);
    assert_eq!(src.calls(), 0);
}
