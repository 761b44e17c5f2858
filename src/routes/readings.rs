//! `/readings` endpoints: the filtered reading list and single-reading details.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{blank_date, criteria_from_query, AppState};
use crate::{select, NormalizedRecord};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/readings", get(list))
        .route("/readings/{id}", get(detail))
}

/// Query parameters for filtering readings
#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    /// Comma-separated sensor ids; absent or empty means all sensors
    sensor_ids: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    end_date: Option<NaiveDate>,
    limit: Option<u32>,
}

async fn list(
    Query(params): Query<ReadingsQuery>,
    State((dataset, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /readings - {:?}", params);

    let criteria = criteria_from_query(
        params.sensor_ids.as_deref(),
        params.start_date,
        params.end_date,
    );
    let selected = select(&dataset.readings, &criteria, &config.viewer_offset);

    let limit = params
        .limit
        .unwrap_or(config.readings_limit_max)
        .min(config.readings_limit_max) as usize;

    debug!(
        "GET /readings - {} matched, returning at most {}",
        selected.len(),
        limit
    );

    let page: Vec<NormalizedRecord> = selected.into_iter().take(limit).collect();
    (StatusCode::OK, Json(page))
}

/// Details view of one reading.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingDetails {
    sensor_name: String,
    #[serde(flatten)]
    reading: NormalizedRecord,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn detail(Path(id): Path<String>, State((dataset, _)): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /readings/{}", id);

    let Some(record) = dataset.find(&id) else {
        debug!("GET /readings/{} - not found", id);
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("Reading {} not found", id),
            }),
        )
            .into_response();
    };

    let details = ReadingDetails {
        sensor_name: dataset.directory.name_of(&record.sensor_id).to_string(),
        reading: record.to_normalized(),
    };

    (StatusCode::OK, Json(details)).into_response()
}
