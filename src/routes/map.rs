//! `/map` endpoint: sampled markers, optional paths and view bounds for the
//! current filter state.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use super::{blank_date, criteria_from_query, AppState};
use crate::{map_layers, select};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/map", get(handler))
}

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    sensor_ids: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    show_paths: bool,
}

async fn handler(
    Query(params): Query<MapQuery>,
    State((dataset, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /map - {:?}", params);

    let criteria = criteria_from_query(
        params.sensor_ids.as_deref(),
        params.start_date,
        params.end_date,
    );
    let selected = select(&dataset.readings, &criteria, &config.viewer_offset);
    let layers = map_layers(&selected, params.show_paths, &dataset.directory);

    debug!(
        "GET /map - {} readings, {} markers, {} paths",
        layers.total_readings,
        layers.markers.len(),
        layers.paths.len()
    );

    (StatusCode::OK, Json(layers))
}
