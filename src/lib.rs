// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod feed;
pub mod metrics;
pub mod sensors;
pub mod setup;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::coordinator::{Coordinator, CoordinatorStatus};
pub use crate::feed::error::{FeedError, UpdateFailed};
pub use crate::feed::snapshot::FeedSnapshot;
pub use crate::feed::types::{AlertRecord, AlertSource};
