//! Sensor directory: display name and color per sensor identifier.
//!
//! The table is configuration, loaded once at startup from the file named
//! by `SENSOR_DIRECTORY_PATH`. Unknown identifiers never fail a lookup; they
//! fall back to the identifier itself and the fallback color.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---

pub const DEFAULT_FALLBACK_COLOR: &str = "#95A5A6";

fn default_fallback_color() -> String {
    DEFAULT_FALLBACK_COLOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    pub name: String,
    pub color: String,
}

/// Closed mapping from sensor id to [`SensorProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDirectory {
    // ---
    #[serde(default = "default_fallback_color")]
    fallback_color: String,
    #[serde(default)]
    sensors: BTreeMap<String, SensorProfile>,
}

impl Default for SensorDirectory {
    fn default() -> Self {
        Self {
            fallback_color: default_fallback_color(),
            sensors: BTreeMap::new(),
        }
    }
}

impl SensorDirectory {
    // ---
    /// Build a directory from `(id, name, color)` triples.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        // ---
        let sensors = entries
            .into_iter()
            .map(|(id, name, color)| {
                (
                    id.into(),
                    SensorProfile {
                        name: name.into(),
                        color: color.into(),
                    },
                )
            })
            .collect();

        Self {
            fallback_color: default_fallback_color(),
            sensors,
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Display name, or the identifier itself when unknown.
    pub fn name_of<'a>(&'a self, sensor_id: &'a str) -> &'a str {
        self.sensors
            .get(sensor_id)
            .map_or(sensor_id, |profile| profile.name.as_str())
    }

    /// Display color, or the fallback color when unknown.
    pub fn color_of(&self, sensor_id: &str) -> &str {
        self.sensors
            .get(sensor_id)
            .map_or(self.fallback_color.as_str(), |profile| profile.color.as_str())
    }

    pub fn contains(&self, sensor_id: &str) -> bool {
        self.sensors.contains_key(sensor_id)
    }

    pub fn fallback_color(&self) -> &str {
        &self.fallback_color
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
