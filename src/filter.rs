//! Filter engine: selects and time-orders normalized readings.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::debug;

use crate::models::{CanonicalRecord, NormalizedRecord};

// ---

/// Operator-chosen selection criteria.
///
/// An empty `sensor_ids` set selects every sensor. Date bounds are inclusive
/// calendar dates in the viewer's calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    // ---
    pub sensor_ids: BTreeSet<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterCriteria {
    // ---
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_sensors<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensor_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    fn matches_sensor(&self, sensor_id: &str) -> bool {
        self.sensor_ids.is_empty() || self.sensor_ids.contains(sensor_id)
    }

    fn matches_date(&self, day: NaiveDate) -> bool {
        // ---
        self.start_date.map_or(true, |start| day >= start)
            && self.end_date.map_or(true, |end| day <= end)
    }
}

/// Calendar date of `instant` in the viewer's calendar.
pub fn calendar_date(instant: DateTime<Utc>, viewer: &FixedOffset) -> NaiveDate {
    instant.with_timezone(viewer).date_naive()
}

/// Normalize, filter and chronologically order `records`.
///
/// A record survives when its sensor is selected, its calendar date lies
/// within the inclusive bounds and both resolved coordinates are present.
/// Survivors are sorted by timestamp; equal timestamps keep input order.
pub fn select(
    records: &[CanonicalRecord],
    criteria: &FilterCriteria,
    viewer: &FixedOffset,
) -> Vec<NormalizedRecord> {
    // ---
    let mut selected: Vec<NormalizedRecord> = records
        .iter()
        .filter(|r| criteria.matches_sensor(&r.sensor_id))
        .filter(|r| criteria.matches_date(calendar_date(r.timestamp, viewer)))
        .map(CanonicalRecord::to_normalized)
        .filter(|n| n.position().is_some())
        .collect();

    // `sort_by_key` is stable, ties keep input order
    selected.sort_by_key(NormalizedRecord::timestamp);

    debug!(
        "Filter kept {} of {} readings ({} sensors selected, dates {:?}..={:?})",
        selected.len(),
        records.len(),
        criteria.sensor_ids.len(),
        criteria.start_date,
        criteria.end_date
    );

    selected
}
