// src/sensors.rs
//! Sensor entities as read-only projections of [`CoordinatorStatus`].
//!
//! Nothing here keeps state; each call re-derives the entity from the
//! coordinator's current view.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::coordinator::CoordinatorStatus;

pub const DOMAIN: &str = "nodvarsel";
pub const ATTRIBUTION: &str = "Data fra nodvarsel.no";
pub const SOURCE_URL: &str = "https://www.nodvarsel.no";
pub const NO_ACTIVE_ALERTS: &str = "Ingen aktive varsler";

// longest state string a consumer is expected to store
const MAX_STATE_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub configuration_url: &'static str,
    pub entry_type: &'static str,
}

impl DeviceInfo {
    pub fn for_entry(entry_id: &str) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_string(), entry_id.to_string())],
            name: "Nødvarsel",
            manufacturer: "DSB, Politiet og Sivilforsvaret",
            model: "Nødvarsel RSS",
            configuration_url: SOURCE_URL,
            entry_type: "service",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    ActiveAlert,
    AlertCount,
    LastAlert,
    LastUpdate,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::ActiveAlert,
        SensorKind::AlertCount,
        SensorKind::LastAlert,
        SensorKind::LastUpdate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SensorKind::ActiveAlert => "active_alert",
            SensorKind::AlertCount => "alert_count",
            SensorKind::LastAlert => "last_alert",
            SensorKind::LastUpdate => "last_update",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    fn unique_suffix(self) -> &'static str {
        match self {
            SensorKind::ActiveAlert => "active",
            SensorKind::AlertCount => "count",
            SensorKind::LastAlert => "last_alert",
            SensorKind::LastUpdate => "last_update",
        }
    }

    fn name(self) -> &'static str {
        match self {
            SensorKind::ActiveAlert => "Aktivt nødvarsel",
            SensorKind::AlertCount => "Antall nødvarsler",
            SensorKind::LastAlert => "Siste nødvarsel",
            SensorKind::LastUpdate => "Sist oppdatert",
        }
    }
}

/// One entity as presented to consumers of the API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntityState {
    pub unique_id: String,
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'static str>,
    pub available: bool,
    pub state: Value,
    pub attributes: Map<String, Value>,
    pub attribution: &'static str,
    pub device: DeviceInfo,
}

impl EntityState {
    fn base(kind: SensorKind, status: &CoordinatorStatus, entry_id: &str) -> Self {
        Self {
            unique_id: format!("{entry_id}_{}", kind.unique_suffix()),
            key: kind.key(),
            name: kind.name(),
            icon: "",
            device_class: None,
            state_class: None,
            unit_of_measurement: None,
            available: status.last_update_success,
            state: Value::Null,
            attributes: Map::new(),
            attribution: ATTRIBUTION,
            device: DeviceInfo::for_entry(entry_id),
        }
    }
}

/// Project a single sensor from the coordinator view.
pub fn project(kind: SensorKind, status: &CoordinatorStatus, entry_id: &str) -> EntityState {
    let mut e = EntityState::base(kind, status, entry_id);
    let data = status.data.as_deref();

    match kind {
        SensorKind::ActiveAlert => {
            e.device_class = Some("safety");
            let on = data.map(|d| d.has_active_alert);
            e.icon = if on == Some(true) {
                "mdi:alert-octagram"
            } else {
                "mdi:shield-check"
            };
            if let (Some(on), Some(d)) = (on, data) {
                e.state = Value::Bool(on);
                e.attributes.insert(
                    "alerts".into(),
                    serde_json::to_value(&d.alerts).unwrap_or_default(),
                );
                e.attributes.insert("alert_count".into(), json!(d.alert_count));
                e.attributes.insert("source".into(), json!(SOURCE_URL));
            }
        }
        SensorKind::AlertCount => {
            e.icon = "mdi:counter";
            e.state_class = Some("measurement");
            e.unit_of_measurement = Some("varsler");
            if let Some(d) = data {
                e.state = json!(d.alert_count);
            }
        }
        SensorKind::LastAlert => {
            e.icon = "mdi:alert-circle-outline";
            if let Some(d) = data {
                match &d.last_alert {
                    Some(last) => {
                        e.state = json!(truncate_chars(&last.title, MAX_STATE_LEN));
                        e.attributes.insert("title".into(), json!(last.title));
                        e.attributes.insert("description".into(), json!(last.description));
                        e.attributes.insert("link".into(), json!(last.link));
                        e.attributes.insert("updated".into(), json!(last.updated));
                    }
                    None => e.state = json!(NO_ACTIVE_ALERTS),
                }
                e.attributes.insert("source".into(), json!(SOURCE_URL));
            }
        }
        SensorKind::LastUpdate => {
            e.icon = "mdi:clock-check-outline";
            e.device_class = Some("timestamp");
            if let Some(ts) = status.last_success_at {
                e.state = json!(ts.to_rfc3339());
            }
        }
    }
    e
}

/// All four sensors, in a stable order.
pub fn all(status: &CoordinatorStatus, entry_id: &str) -> Vec<EntityState> {
    SensorKind::ALL
        .into_iter()
        .map(|k| project(k, status, entry_id))
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
