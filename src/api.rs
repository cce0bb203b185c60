// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::config::options::Options;
use crate::coordinator::{Coordinator, CoordinatorStatus};
use crate::feed::snapshot::FeedSnapshot;
use crate::sensors::{self, EntityState, SensorKind};

#[derive(Clone)]
pub struct AppState {
    coordinator: Arc<Coordinator>,
    entry_id: Arc<str>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>, entry_id: &str) -> Self {
        Self {
            coordinator,
            entry_id: Arc::from(entry_id),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/{key}", get(get_sensor))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/status", get(get_status))
        .route("/api/options", get(get_options).put(put_options))
        .route("/api/refresh", post(refresh_now))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ErrorOut {
    error: String,
}

fn error(status: StatusCode, msg: impl ToString) -> (StatusCode, Json<ErrorOut>) {
    (
        status,
        Json(ErrorOut {
            error: msg.to_string(),
        }),
    )
}

#[derive(serde::Serialize)]
struct StatusOut {
    last_update_success: bool,
    last_success_at: Option<DateTime<Utc>>,
    last_attempt_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    scan_interval: u64,
    polls_completed: u64,
    alert_count: Option<usize>,
}

impl From<CoordinatorStatus> for StatusOut {
    fn from(s: CoordinatorStatus) -> Self {
        Self {
            last_update_success: s.last_update_success,
            last_success_at: s.last_success_at,
            last_attempt_at: s.last_attempt_at,
            last_error: s.last_error,
            scan_interval: s.scan_interval,
            polls_completed: s.polls_completed,
            alert_count: s.data.map(|d| d.alert_count),
        }
    }
}

async fn list_sensors(State(state): State<AppState>) -> Json<Vec<EntityState>> {
    let status = state.coordinator.status();
    Json(sensors::all(&status, &state.entry_id))
}

async fn get_sensor(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntityState>, (StatusCode, Json<ErrorOut>)> {
    let kind = SensorKind::from_key(&key)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("unknown sensor '{key}'")))?;
    let status = state.coordinator.status();
    Ok(Json(sensors::project(kind, &status, &state.entry_id)))
}

async fn get_snapshot(State(state): State<AppState>) -> Json<Option<FeedSnapshot>> {
    Json(state.coordinator.snapshot().map(|s| (*s).clone()))
}

async fn get_status(State(state): State<AppState>) -> Json<StatusOut> {
    Json(state.coordinator.status().into())
}

async fn get_options(State(state): State<AppState>) -> Json<Options> {
    Json(Options {
        scan_interval: state.coordinator.scan_interval(),
    })
}

async fn put_options(
    State(state): State<AppState>,
    Json(body): Json<Options>,
) -> Result<Json<Options>, (StatusCode, Json<ErrorOut>)> {
    state
        .coordinator
        .set_scan_interval(body.scan_interval)
        .map_err(|e| error(StatusCode::UNPROCESSABLE_ENTITY, e))?;
    Ok(Json(body))
}

async fn refresh_now(
    State(state): State<AppState>,
) -> Result<Json<StatusOut>, (StatusCode, Json<ErrorOut>)> {
    state
        .coordinator
        .refresh()
        .await
        .map_err(|e| error(StatusCode::BAD_GATEWAY, e))?;
    Ok(Json(state.coordinator.status().into()))
}
