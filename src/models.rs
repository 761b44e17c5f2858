//! Data models for the fleet telemetry pipeline.
//!
//! `CanonicalRecord` mirrors one entry of the readings document as received;
//! `NormalizedRecord` pairs it with the precedence-resolved `Measurements`
//! produced by [`crate::resolver`].

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver;

// ---

/// Multiplexed device payload keyed by protocol code (`"1"`, `"16"`, `"latlng"`, ...).
///
/// Keys overlap and any of them may be missing; a missing key is not the
/// same thing as a zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(BTreeMap<String, Value>);

impl RawPayload {
    // ---
    /// Finite JSON number stored under `key`.
    pub fn number(&self, key: &str) -> Option<f64> {
        // ---
        self.0
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// String stored under `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// `raw` envelope of a reading: `{ state: { reported: { ... } } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RawState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<RawPayload>,
}

impl RawEnvelope {
    // ---
    pub fn reported(&self) -> Option<&RawPayload> {
        self.state.as_ref()?.reported.as_ref()
    }
}

/// One telemetry event as delivered in the readings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    // ---
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub fuel_level: Option<f64>,
    pub location_lat: Option<f64>,
    pub location_long: Option<f64>,
    pub sensor_id: String,
    pub device_voltage: Option<f64>,
    /// `"ON"`, `"OFF"` or missing.
    pub ignition_status: Option<String>,
    pub speed: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub raw: Option<RawEnvelope>,
    pub topic: Option<String>,
    pub address: Option<String>,
    pub is_over_speed: Option<bool>,
    pub odometer_km: Option<f64>,
    #[serde(default)]
    pub processed: bool,
}

impl CanonicalRecord {
    // ---
    /// Payload under `raw.state.reported`, when the device sent one.
    pub fn payload(&self) -> Option<&RawPayload> {
        self.raw.as_ref()?.reported()
    }

    /// Build the normalized view of this record without consuming it.
    pub fn to_normalized(&self) -> NormalizedRecord {
        normalize(self.clone())
    }
}

/// Physical measurements resolved from a record and its payload.
///
/// Every field is independently nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    // ---
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters.
    pub altitude: Option<f64>,
    /// Bearing in degrees.
    pub angle: Option<f64>,
    pub satellites: Option<f64>,
    pub odometer_km: Option<f64>,
    /// km/h.
    pub speed: Option<f64>,
    pub ignition: Option<bool>,
    pub event_code: Option<f64>,
    /// Volts.
    pub device_voltage: Option<f64>,
    /// Device clock, milliseconds since the epoch.
    pub device_timestamp: Option<f64>,
}

impl Measurements {
    // ---
    /// `(latitude, longitude)` when both resolved.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// A canonical record with its resolved measurement set attached.
///
/// Built once by [`normalize`]; there are no setters, a changed source
/// record is normalized again instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    record: CanonicalRecord,
    parsed: Measurements,
}

impl NormalizedRecord {
    // ---
    pub fn record(&self) -> &CanonicalRecord {
        &self.record
    }

    pub fn parsed(&self) -> &Measurements {
        &self.parsed
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn sensor_id(&self) -> &str {
        &self.record.sensor_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.record.timestamp
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.parsed.position()
    }
}

/// Attach the resolved measurement set to `record`.
///
/// Pure and total; normalizing `n.record()` again yields `n`.
pub fn normalize(record: CanonicalRecord) -> NormalizedRecord {
    // ---
    let parsed = resolver::resolve_all(record.payload(), &record);
    NormalizedRecord { record, parsed }
}

/// Precomputed summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSummary {
    // ---
    pub total_readings: u64,
    pub unique_sensor_ids: Vec<String>,
    pub date_range: DateRange,
    #[serde(default)]
    pub readings_by_sensor: BTreeMap<String, u64>,
}

/// Inclusive `[min, max]` bounds as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: String,
    pub max: String,
}

impl SensorSummary {
    // ---
    pub fn reading_count(&self, sensor_id: &str) -> u64 {
        self.readings_by_sensor.get(sensor_id).copied().unwrap_or(0)
    }

    /// Summary date bounds as calendar dates in the viewer's calendar.
    pub fn date_window(&self, offset: &FixedOffset) -> Option<(NaiveDate, NaiveDate)> {
        // ---
        let min = calendar_date_of(&self.date_range.min, offset)?;
        let max = calendar_date_of(&self.date_range.max, offset)?;
        Some((min, max))
    }
}

/// Calendar date of an ISO-8601 instant (or bare `YYYY-MM-DD`) at `offset`.
fn calendar_date_of(value: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    // ---
    match DateTime::parse_from_rfc3339(value) {
        Ok(instant) => Some(instant.with_timezone(offset).date_naive()),
        Err(_) => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
    }
}

/// Decimated route of one sensor, ready to draw as a polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    // ---
    pub sensor_id: String,
    pub color: String,
    /// `[latitude, longitude]` pairs in chronological order.
    pub vertices: Vec<[f64; 2]>,
}
