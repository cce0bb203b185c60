// src/feed/types.rs
use serde::{Deserialize, Serialize};

use crate::feed::error::FeedError;

/// One emergency alert `<item>` from the feed.
///
/// Every field is the trimmed text of the matching child element, or an
/// empty string when the element is missing or blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertRecord {
    pub guid: String,
    pub link: String,
    pub title: String,
    pub description: String,
    pub updated: String, // as published, Atom `updated` preferred
}

/// Anything that can hand the poll cycle a raw feed body.
#[async_trait::async_trait]
pub trait AlertSource: Send + Sync {
    async fn fetch(&self) -> Result<String, FeedError>;
    fn name(&self) -> &'static str;
}
