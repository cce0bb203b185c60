// src/feed/snapshot.rs
use serde::{Deserialize, Serialize};

use crate::feed::types::AlertRecord;

/// Summary of one successful poll. Built fresh every cycle, never patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub alerts: Vec<AlertRecord>,
    pub alert_count: usize,
    pub has_active_alert: bool,
    pub last_alert: Option<AlertRecord>,
}

/// Reduce parsed records to a snapshot. Feed order and content are kept as-is.
pub fn build(records: Vec<AlertRecord>) -> FeedSnapshot {
    let alert_count = records.len();
    FeedSnapshot {
        last_alert: records.first().cloned(),
        has_active_alert: alert_count > 0,
        alert_count,
        alerts: records,
    }
}
