// src/coordinator.rs
//! Poll coordinator: owns the timer, the single-flight guard and the
//! last-good snapshot.
//!
//! A failed poll never clears cached data; it only flips
//! `last_update_success` and records the error. Every completed poll (either
//! outcome) bumps a generation counter that subscribers can watch.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::gauge;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::options::{validate_scan_interval, OptionsError};
use crate::feed::{self, error::UpdateFailed, snapshot::FeedSnapshot, types::AlertSource};

type Outcome = Result<Arc<FeedSnapshot>, UpdateFailed>;

#[derive(Debug, Default)]
struct State {
    data: Option<Arc<FeedSnapshot>>,
    last_outcome: Option<Outcome>,
    last_success_at: Option<DateTime<Utc>>,
    last_attempt_at: Option<DateTime<Utc>>,
    generation: u64,
}

/// Point-in-time view of the coordinator, handed to sensors and the API.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorStatus {
    pub data: Option<Arc<FeedSnapshot>>,
    pub last_update_success: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub scan_interval: u64,
    pub polls_completed: u64,
}

pub struct Coordinator {
    source: Arc<dyn AlertSource>,
    state: RwLock<State>,
    in_flight: Mutex<()>,
    interval_tx: watch::Sender<u64>,
    updates_tx: watch::Sender<u64>,
}

impl Coordinator {
    pub fn new(source: Arc<dyn AlertSource>, scan_interval: u64) -> Result<Arc<Self>, OptionsError> {
        let secs = validate_scan_interval(scan_interval)?;
        gauge!("nodvarsel_scan_interval_seconds").set(secs as f64);
        Ok(Arc::new(Self {
            source,
            state: RwLock::new(State::default()),
            in_flight: Mutex::new(()),
            interval_tx: watch::Sender::new(secs),
            updates_tx: watch::Sender::new(0),
        }))
    }

    /// Initial refresh at startup. The error is returned for the caller to
    /// log; the timer keeps retrying either way.
    pub async fn first_refresh(&self) -> Result<(), UpdateFailed> {
        self.refresh().await.map(|_| ())
    }

    /// Run one poll cycle and update the cache.
    ///
    /// If another refresh is in flight, waits for it and returns its outcome
    /// instead of fetching again.
    pub async fn refresh(&self) -> Outcome {
        let seen = self.read_state().generation;
        let _guard = self.in_flight.lock().await;
        {
            let s = self.read_state();
            if s.generation != seen {
                if let Some(outcome) = s.last_outcome.clone() {
                    return outcome;
                }
            }
        }

        let outcome = feed::poll(self.source.as_ref()).await.map(Arc::new);
        self.record(outcome)
    }

    fn record(&self, outcome: Outcome) -> Outcome {
        let now = Utc::now();
        let generation = {
            let mut s = self.write_state();
            let was_failing = matches!(s.last_outcome, Some(Err(_)));
            s.last_attempt_at = Some(now);
            match &outcome {
                Ok(snap) => {
                    s.data = Some(Arc::clone(snap));
                    s.last_success_at = Some(now);
                    if was_failing {
                        tracing::info!(target: "coordinator", source = self.source.name(), "fetching alerts recovered");
                    }
                }
                // log once per failure streak, not on every tick
                Err(err) if was_failing => {
                    tracing::debug!(target: "coordinator", error = %err, "poll still failing");
                }
                Err(err) => {
                    tracing::warn!(target: "coordinator", source = self.source.name(), error = %err, "poll failed");
                }
            }
            s.last_outcome = Some(outcome.clone());
            s.generation += 1;
            s.generation
        };
        self.updates_tx.send_replace(generation);
        outcome
    }

    /// Cached snapshot from the last successful poll.
    pub fn snapshot(&self) -> Option<Arc<FeedSnapshot>> {
        self.read_state().data.clone()
    }

    pub fn status(&self) -> CoordinatorStatus {
        let s = self.read_state();
        CoordinatorStatus {
            data: s.data.clone(),
            last_update_success: matches!(s.last_outcome, Some(Ok(_))),
            last_success_at: s.last_success_at,
            last_attempt_at: s.last_attempt_at,
            last_error: match &s.last_outcome {
                Some(Err(e)) => Some(e.to_string()),
                _ => None,
            },
            scan_interval: self.scan_interval(),
            polls_completed: s.generation,
        }
    }

    /// Receiver that changes after every completed poll.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates_tx.subscribe()
    }

    pub fn scan_interval(&self) -> u64 {
        *self.interval_tx.borrow()
    }

    /// Change the poll interval of a running coordinator. The timer wakes,
    /// refreshes immediately and then sleeps the new interval.
    pub fn set_scan_interval(&self, secs: u64) -> Result<(), OptionsError> {
        let secs = validate_scan_interval(secs)?;
        let old = self.interval_tx.send_replace(secs);
        gauge!("nodvarsel_scan_interval_seconds").set(secs as f64);
        tracing::info!(target: "coordinator", old, new = secs, "scan interval updated");
        Ok(())
    }

    /// Start the timer loop. Abort the handle to stop polling; an in-flight
    /// request is simply dropped.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let mut interval_rx = self.interval_tx.subscribe();
        tokio::spawn(async move {
            loop {
                let secs = *interval_rx.borrow_and_update();
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                    changed = interval_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        tracing::debug!(target: "coordinator", "interval changed, refreshing now");
                    }
                }
                // outcome is cached and logged by refresh()
                let _ = this.refresh().await;
            }
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poison| poison.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poison| poison.into_inner())
    }
}
