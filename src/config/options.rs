// src/config/options.rs
//! The one user-facing option: how often to poll the feed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SCAN_INTERVAL: u64 = 90; // seconds
pub const MIN_SCAN_INTERVAL: u64 = 30;
pub const MAX_SCAN_INTERVAL: u64 = 600;

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("scan_interval must be between {min} and {max} seconds, got {value}")]
    ScanIntervalOutOfRange { value: u64, min: u64, max: u64 },
}

/// Runtime-adjustable options, as read from config or `PUT /api/options`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Options {
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

pub fn validate_scan_interval(secs: u64) -> Result<u64, OptionsError> {
    if (MIN_SCAN_INTERVAL..=MAX_SCAN_INTERVAL).contains(&secs) {
        Ok(secs)
    } else {
        Err(OptionsError::ScanIntervalOutOfRange {
            value: secs,
            min: MIN_SCAN_INTERVAL,
            max: MAX_SCAN_INTERVAL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        assert_eq!(validate_scan_interval(30), Ok(30));
        assert_eq!(validate_scan_interval(600), Ok(600));
        assert!(validate_scan_interval(29).is_err());
        assert!(validate_scan_interval(601).is_err());
    }

    #[test]
    fn missing_field_uses_default() {
        let o: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(o.scan_interval, 90);
        assert_eq!(validate_scan_interval(o.scan_interval), Ok(90));
    }

    #[test]
    fn error_message_names_bounds() {
        let err = validate_scan_interval(5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "scan_interval must be between 30 and 600 seconds, got 5"
        );
    }
}
