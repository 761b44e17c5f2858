//! Field resolver for the multiplexed device payload.
//!
//! Devices report the same physical quantity under several protocol keys
//! depending on firmware revision, and the canonical top-level fields carry
//! yet another copy. Each derived field is resolved by walking an ordered
//! chain of [`Candidate`]s; the first candidate that yields a value wins.
//!
//! Chains are plain `const` slices so the precedence policy for every field
//! can be read (and tested) in one place.

use crate::models::{CanonicalRecord, Measurements, RawPayload};

// ---

/// Protocol keys used under `raw.state.reported`.
pub mod keys {
    pub const IGNITION: &str = "1";
    pub const ODOMETER_METERS: &str = "16";
    pub const ODOMETER: &str = "241";
    pub const SPEED: &str = "21";
    pub const SPEED_ALT: &str = "sp";
    pub const VOLTAGE_MILLIVOLTS: &str = "66";
    pub const ALTITUDE: &str = "alt";
    pub const ANGLE: &str = "ang";
    pub const SATELLITES: &str = "sat";
    pub const EVENT_CODE: &str = "evt";
    pub const DEVICE_TIMESTAMP: &str = "ts";
    pub const LAT_LNG: &str = "latlng";
}

/// Token in `ignitionStatus` that means the engine is running.
pub const IGNITION_ON: &str = "ON";

/// Everything a candidate may look at.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    pub payload: Option<&'a RawPayload>,
    pub record: &'a CanonicalRecord,
}

/// One entry of a precedence chain.
///
/// `extract` returns `None` when its source does not apply, which hands the
/// decision to the next candidate.
pub struct Candidate<T> {
    pub source: &'static str,
    pub extract: fn(&ResolverInput<'_>) -> Option<T>,
}

/// First value produced by `chain`, if any.
pub fn resolve<T>(chain: &[Candidate<T>], input: &ResolverInput<'_>) -> Option<T> {
    chain.iter().find_map(|candidate| (candidate.extract)(input))
}

/// Name of the candidate that wins for `input`.
pub fn winning_source<T>(chain: &[Candidate<T>], input: &ResolverInput<'_>) -> Option<&'static str> {
    // ---
    chain
        .iter()
        .find(|candidate| (candidate.extract)(input).is_some())
        .map(|candidate| candidate.source)
}

/// Resolve the full measurement set for `record`.
///
/// `payload` is normally `record.payload()`; it is a separate argument so a
/// record can be resolved against a different payload in tests.
pub fn resolve_all(payload: Option<&RawPayload>, record: &CanonicalRecord) -> Measurements {
    // ---
    let input = ResolverInput { payload, record };

    Measurements {
        latitude: resolve(LATITUDE, &input),
        longitude: resolve(LONGITUDE, &input),
        altitude: resolve(ALTITUDE, &input),
        angle: resolve(ANGLE, &input),
        satellites: resolve(SATELLITES, &input),
        odometer_km: resolve(ODOMETER_KM, &input),
        speed: resolve(SPEED, &input),
        ignition: resolve(IGNITION, &input),
        event_code: resolve(EVENT_CODE, &input),
        device_voltage: resolve(DEVICE_VOLTAGE, &input),
        device_timestamp: resolve(DEVICE_TIMESTAMP, &input),
    }
}

// --- precedence chains

pub const LATITUDE: &[Candidate<f64>] = &[
    Candidate { source: "payload.latlng", extract: latlng_latitude },
    Candidate { source: "record.locationLat", extract: record_latitude },
];

pub const LONGITUDE: &[Candidate<f64>] = &[
    Candidate { source: "payload.latlng", extract: latlng_longitude },
    Candidate { source: "record.locationLong", extract: record_longitude },
];

pub const ALTITUDE: &[Candidate<f64>] = &[Candidate { source: "payload.alt", extract: payload_altitude }];

pub const ANGLE: &[Candidate<f64>] = &[Candidate { source: "payload.ang", extract: payload_angle }];

pub const SATELLITES: &[Candidate<f64>] = &[Candidate { source: "payload.sat", extract: payload_satellites }];

pub const EVENT_CODE: &[Candidate<f64>] = &[Candidate { source: "payload.evt", extract: payload_event_code }];

pub const DEVICE_TIMESTAMP: &[Candidate<f64>] =
    &[Candidate { source: "payload.ts", extract: payload_device_timestamp }];

pub const ODOMETER_KM: &[Candidate<f64>] = &[
    Candidate { source: "payload.16", extract: payload_odometer_meters },
    Candidate { source: "payload.241", extract: payload_odometer },
    Candidate { source: "record.odometerKm", extract: record_odometer },
];

pub const SPEED: &[Candidate<f64>] = &[
    Candidate { source: "payload.21", extract: payload_speed },
    Candidate { source: "payload.sp", extract: payload_speed_alt },
    Candidate { source: "record.speed", extract: record_speed },
];

pub const IGNITION: &[Candidate<bool>] = &[
    Candidate { source: "payload.1", extract: payload_ignition },
    Candidate { source: "record.ignitionStatus", extract: record_ignition },
];

pub const DEVICE_VOLTAGE: &[Candidate<f64>] = &[
    Candidate { source: "payload.66", extract: payload_voltage_millivolts },
    Candidate { source: "record.deviceVoltage", extract: record_voltage },
];

// --- extractors

fn payload_number(input: &ResolverInput<'_>, key: &str) -> Option<f64> {
    input.payload?.number(key)
}

/// Payload number that must also be non-zero; a literal `0` counts as absent.
fn payload_nonzero(input: &ResolverInput<'_>, key: &str) -> Option<f64> {
    payload_number(input, key).filter(|v| *v != 0.0)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Parse the combined `"lat,lng"` field. Both halves must be finite numbers.
pub fn parse_lat_lng(text: &str) -> Option<(f64, f64)> {
    // ---
    let mut parts = text.split(',');
    let lat = parse_coordinate(parts.next()?)?;
    let lng = parse_coordinate(parts.next()?)?;
    Some((lat, lng))
}

fn parse_coordinate(part: &str) -> Option<f64> {
    // ---
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn latlng(input: &ResolverInput<'_>) -> Option<(f64, f64)> {
    parse_lat_lng(input.payload?.text(keys::LAT_LNG)?)
}

fn latlng_latitude(input: &ResolverInput<'_>) -> Option<f64> {
    latlng(input).map(|(lat, _)| lat)
}

fn latlng_longitude(input: &ResolverInput<'_>) -> Option<f64> {
    latlng(input).map(|(_, lng)| lng)
}

fn record_latitude(input: &ResolverInput<'_>) -> Option<f64> {
    finite(input.record.location_lat)
}

fn record_longitude(input: &ResolverInput<'_>) -> Option<f64> {
    finite(input.record.location_long)
}

fn payload_altitude(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::ALTITUDE)
}

fn payload_angle(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::ANGLE)
}

fn payload_satellites(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::SATELLITES)
}

fn payload_event_code(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::EVENT_CODE)
}

fn payload_device_timestamp(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::DEVICE_TIMESTAMP)
}

fn payload_odometer_meters(input: &ResolverInput<'_>) -> Option<f64> {
    payload_nonzero(input, keys::ODOMETER_METERS).map(|meters| meters / 1000.0)
}

fn payload_odometer(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::ODOMETER)
}

fn record_odometer(input: &ResolverInput<'_>) -> Option<f64> {
    finite(input.record.odometer_km)
}

fn payload_speed(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::SPEED)
}

fn payload_speed_alt(input: &ResolverInput<'_>) -> Option<f64> {
    payload_number(input, keys::SPEED_ALT)
}

fn record_speed(input: &ResolverInput<'_>) -> Option<f64> {
    finite(input.record.speed)
}

fn payload_ignition(input: &ResolverInput<'_>) -> Option<bool> {
    // ---
    match payload_number(input, keys::IGNITION)? {
        v if v == 1.0 => Some(true),
        v if v == 0.0 => Some(false),
        _ => None,
    }
}

fn record_ignition(input: &ResolverInput<'_>) -> Option<bool> {
    input
        .record
        .ignition_status
        .as_deref()
        .map(|state| state == IGNITION_ON)
}

fn payload_voltage_millivolts(input: &ResolverInput<'_>) -> Option<f64> {
    payload_nonzero(input, keys::VOLTAGE_MILLIVOLTS).map(|mv| mv / 1000.0)
}

fn record_voltage(input: &ResolverInput<'_>) -> Option<f64> {
    finite(input.record.device_voltage)
}
