//! Spatial sampler: decimates a filtered, time-ordered reading set into
//! marker sets and per-sensor paths that a map can render.
//!
//! Markers and paths use different policies. Markers keep a flat,
//! index-based subset regardless of sensor; paths are grouped by sensor and
//! always end on the sensor's most recent point.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::directory::SensorDirectory;
use crate::models::{NormalizedRecord, PathSegment};

// ---

/// Map center used when there is nothing to fit the view to.
pub const DEFAULT_CENTER: [f64; 2] = [26.86, 80.93];
pub const DEFAULT_ZOOM: u8 = 12;

/// Decimation divisor for markers given the total record count.
pub fn marker_sample_rate(count: usize) -> usize {
    // ---
    match count {
        n if n > 10_000 => 15,
        n if n > 5_000 => 8,
        n if n > 2_000 => 4,
        _ => 1,
    }
}

/// Decimation divisor for one sensor's path given its point count.
pub fn path_sample_rate(count: usize) -> usize {
    // ---
    match count {
        n if n > 3_000 => 20,
        n if n > 1_000 => 10,
        _ => 5,
    }
}

/// Keep every k-th record by index, `k` from [`marker_sample_rate`].
pub fn sample_markers(records: &[NormalizedRecord]) -> Vec<&NormalizedRecord> {
    // ---
    let rate = marker_sample_rate(records.len());
    records.iter().step_by(rate).collect()
}

/// Build one decimated path per sensor with at least two located points.
///
/// Segments come out in order of each sensor's first appearance in
/// `records`.
pub fn sample_paths(records: &[NormalizedRecord], directory: &SensorDirectory) -> Vec<PathSegment> {
    // ---
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&NormalizedRecord>> = BTreeMap::new();

    for record in records {
        let group = groups.entry(record.sensor_id()).or_insert_with(|| {
            order.push(record.sensor_id());
            Vec::new()
        });
        group.push(record);
    }

    order
        .into_iter()
        .filter_map(|sensor_id| {
            let group = groups.remove(sensor_id)?;
            sample_path(sensor_id, group, directory)
        })
        .collect()
}

fn sample_path(
    sensor_id: &str,
    group: Vec<&NormalizedRecord>,
    directory: &SensorDirectory,
) -> Option<PathSegment> {
    // ---
    let mut located: Vec<(DateTime<Utc>, (f64, f64))> = group
        .into_iter()
        .filter_map(|r| Some((r.timestamp(), r.position()?)))
        .collect();

    if located.len() < 2 {
        return None;
    }

    // Input is normally sorted already; the sort is stable either way
    located.sort_by_key(|(timestamp, _)| *timestamp);

    let rate = path_sample_rate(located.len());
    let last = located.len() - 1;
    let vertices = located
        .iter()
        .enumerate()
        .filter(|(idx, _)| idx % rate == 0 || *idx == last)
        .map(|(_, (_, (lat, lng)))| [*lat, *lng])
        .collect();

    Some(PathSegment {
        sensor_id: sensor_id.to_string(),
        color: directory.color_of(sensor_id).to_string(),
        vertices,
    })
}

/// Bounding box of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Box around every located record; `None` when nothing is located.
pub fn bounds(records: &[NormalizedRecord]) -> Option<Bounds> {
    // ---
    records
        .iter()
        .filter_map(NormalizedRecord::position)
        .fold(None, |acc: Option<Bounds>, (lat, lng)| {
            Some(match acc {
                None => Bounds { south: lat, west: lng, north: lat, east: lng },
                Some(b) => Bounds {
                    south: b.south.min(lat),
                    west: b.west.min(lng),
                    north: b.north.max(lat),
                    east: b.east.max(lng),
                },
            })
        })
}

/// Popup-sized view of one reading on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    // ---
    pub id: String,
    pub sensor_id: String,
    pub sensor_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub speed: Option<f64>,
    pub odometer_km: Option<f64>,
    pub ignition: Option<bool>,
}

impl Marker {
    // ---
    /// `None` for a record without resolved coordinates.
    pub fn from_record(record: &NormalizedRecord, directory: &SensorDirectory) -> Option<Self> {
        // ---
        let (latitude, longitude) = record.position()?;
        let parsed = record.parsed();

        Some(Self {
            id: record.id().to_string(),
            sensor_id: record.sensor_id().to_string(),
            sensor_name: directory.name_of(record.sensor_id()).to_string(),
            latitude,
            longitude,
            timestamp: record.timestamp(),
            speed: parsed.speed,
            odometer_km: parsed.odometer_km,
            ignition: parsed.ignition,
        })
    }
}

/// Everything the map draws for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLayers {
    // ---
    pub total_readings: usize,
    pub markers: Vec<Marker>,
    pub paths: Vec<PathSegment>,
    pub bounds: Option<Bounds>,
    pub center: [f64; 2],
    pub zoom: u8,
}

/// Run both sampling policies over `records`.
///
/// Paths are only built when `show_paths` is set.
pub fn map_layers(
    records: &[NormalizedRecord],
    show_paths: bool,
    directory: &SensorDirectory,
) -> MapLayers {
    // ---
    let markers = sample_markers(records)
        .into_iter()
        .filter_map(|r| Marker::from_record(r, directory))
        .collect();

    let paths = if show_paths {
        sample_paths(records, directory)
    } else {
        Vec::new()
    };

    let bounds = bounds(records);
    let center = bounds.map_or(DEFAULT_CENTER, |b| {
        [(b.south + b.north) / 2.0, (b.west + b.east) / 2.0]
    });

    MapLayers {
        total_readings: records.len(),
        markers,
        paths,
        bounds,
        center,
        zoom: DEFAULT_ZOOM,
    }
}
