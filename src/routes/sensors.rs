//! Reference-data endpoints: the summary passthrough, the sensor list with
//! display names and counts, and the initial filter state.

use axum::{extract::State, routing::get, Json, Router};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::SensorSummary;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/summary", get(summary))
        .route("/sensors", get(sensors))
        .route("/filters/default", get(default_filters))
}

async fn summary(State((dataset, _)): State<AppState>) -> Json<SensorSummary> {
    info!("GET /summary");
    Json(dataset.summary.clone())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SensorEntry {
    id: String,
    name: String,
    color: String,
    reading_count: u64,
}

async fn sensors(State((dataset, _)): State<AppState>) -> Json<Vec<SensorEntry>> {
    // ---
    info!("GET /sensors");

    let entries = dataset
        .summary
        .unique_sensor_ids
        .iter()
        .map(|id| SensorEntry {
            id: id.clone(),
            name: dataset.directory.name_of(id).to_string(),
            color: dataset.directory.color_of(id).to_string(),
            reading_count: dataset.summary.reading_count(id),
        })
        .collect();

    Json(entries)
}

/// Filter state an operator starts from: every sensor, the full date range,
/// paths hidden.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultFilters {
    sensor_ids: Vec<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    show_paths: bool,
}

async fn default_filters(State((dataset, config)): State<AppState>) -> Json<DefaultFilters> {
    // ---
    info!("GET /filters/default");

    let window = dataset.summary.date_window(&config.viewer_offset);

    Json(DefaultFilters {
        sensor_ids: dataset.summary.unique_sensor_ids.clone(),
        start_date: window.map(|(start, _)| start),
        end_date: window.map(|(_, end)| end),
        show_paths: false,
    })
}
