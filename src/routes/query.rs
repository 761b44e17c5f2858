//! Query-string helpers shared by the filtering endpoints.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

use crate::FilterCriteria;

// ---

/// Deserialize an optional `YYYY-MM-DD` date where a blank value (a cleared
/// date picker sends `start_date=`) means no date.
pub fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    // ---
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid date {:?}: {}", text, e))),
    }
}

/// Split a comma-separated sensor id list, ignoring blank entries.
pub fn parse_sensor_ids(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|id| !id.is_empty())
}

/// Build filter criteria from the common `sensor_ids`, `start_date` and
/// `end_date` query parameters.
pub fn criteria_from_query(
    sensor_ids: Option<&str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> FilterCriteria {
    // ---
    FilterCriteria::all()
        .with_sensors(sensor_ids.map(parse_sensor_ids).into_iter().flatten())
        .with_dates(start_date, end_date)
}
