use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use fleetmap::config::viewer_offset_from_minutes;
use fleetmap::ingest::{parse_readings, parse_summary};
use fleetmap::{routes, Config, Dataset, SensorDirectory};

const SUMMARY: &str = r#"{
    "totalReadings": 5,
    "uniqueSensorIds": ["bus-1", "bus-2"],
    "dateRange": { "min": "2025-03-25T08:00:00Z", "max": "2025-03-26T23:59:00Z" },
    "readingsBySensor": { "bus-1": 2, "bus-2": 3 }
}"#;

const READINGS: &str = r#"[
    {
        "id": "r1", "timestamp": "2025-03-25T08:00:00Z", "createdAt": "2025-03-25T08:00:01Z",
        "sensorId": "bus-1", "locationLat": 26.80, "locationLong": 80.90,
        "ignitionStatus": "ON", "odometerKm": 900.0,
        "raw": { "state": { "reported": { "16": 5000, "241": 12, "1": 0 } } }
    },
    {
        "id": "r2", "timestamp": "2025-03-26T09:00:00Z", "createdAt": "2025-03-26T09:00:01Z",
        "sensorId": "bus-1", "locationLat": 10.0, "locationLong": 10.0, "speed": 5,
        "raw": { "state": { "reported": { "latlng": "26.85,80.95", "21": 44 } } }
    },
    {
        "id": "r3", "timestamp": "2025-03-26T07:00:00Z", "createdAt": "2025-03-26T07:00:01Z",
        "sensorId": "bus-2", "locationLat": 26.70, "locationLong": 80.80, "deviceVoltage": 12.1
    },
    {
        "id": "r4", "timestamp": "2025-03-26T23:59:00Z", "createdAt": "2025-03-26T23:59:01Z",
        "sensorId": "bus-2", "locationLat": 26.71, "locationLong": 80.81,
        "raw": { "state": { "reported": { "66": 12850 } } }
    },
    {
        "id": "r5", "timestamp": "2025-03-26T10:00:00Z", "createdAt": "2025-03-26T10:00:01Z",
        "sensorId": "bus-2"
    }
]"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Parsed {
    latitude: Option<f64>,
    longitude: Option<f64>,
    odometer_km: Option<f64>,
    speed: Option<f64>,
    ignition: Option<bool>,
    device_voltage: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reading {
    id: String,
    sensor_id: String,
    timestamp: DateTime<Utc>,
    parsed: Parsed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Details {
    sensor_name: String,
    id: String,
    parsed: Parsed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Path {
    sensor_id: String,
    color: String,
    vertices: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Marker {
    id: String,
    sensor_name: String,
}

#[derive(Debug, Deserialize)]
struct Bounds {
    south: f64,
    north: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapLayers {
    total_readings: usize,
    markers: Vec<Marker>,
    paths: Vec<Path>,
    bounds: Option<Bounds>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensorEntry {
    id: String,
    name: String,
    color: String,
    reading_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultFilters {
    sensor_ids: Vec<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    show_paths: bool,
}

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_app() -> Result<String> {
    // ---
    let directory = SensorDirectory::from_entries([("bus-1", "Bus 1", "#FF6B6B")]);
    let dataset = Dataset::new(parse_summary(SUMMARY)?, parse_readings(READINGS)?, directory);

    let config = Config {
        summary_source: "memory://summary".into(),
        readings_source: "memory://readings".into(),
        sensor_directory_path: None,
        fetch_timeout_secs: 5,
        viewer_offset: viewer_offset_from_minutes(0)?,
        listen_port: 0,
        readings_limit_max: 1000,
    };

    let app = routes::router(Arc::new(dataset), config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(format!("http://{}", addr))
}

fn ids(readings: &[Reading]) -> Vec<&str> {
    readings.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn health_endpoint_ok() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let response = Client::new().get(format!("{}/health", base)).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn readings_endpoint_normalizes_and_orders() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let readings: Vec<Reading> = Client::new()
        .get(format!("{}/readings", base))
        .send()
        .await?
        .json()
        .await?;

    // r5 has no coordinates anywhere
    assert_eq!(ids(&readings), vec!["r1", "r3", "r2", "r4"]);
    assert!(readings.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(readings
        .iter()
        .all(|r| r.parsed.latitude.is_some() && r.parsed.longitude.is_some()));

    // Payload precedence
    let r1 = &readings[0];
    assert_eq!(r1.parsed.odometer_km, Some(5.0));
    assert_eq!(r1.parsed.ignition, Some(false));

    let r2 = &readings[2];
    assert_eq!(r2.parsed.latitude, Some(26.85));
    assert_eq!(r2.parsed.longitude, Some(80.95));
    assert_eq!(r2.parsed.speed, Some(44.0));

    let r3 = &readings[1];
    assert_eq!(r3.sensor_id, "bus-2");
    assert_eq!(r3.parsed.device_voltage, Some(12.1));
    assert_eq!(readings[3].parsed.device_voltage, Some(12.85));

    Ok(())
}

#[tokio::test]
async fn readings_filters_by_sensor_and_inclusive_dates() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let url = format!("{}/readings?sensor_ids=bus-2&end_date=2025-03-26", base);
    let readings: Vec<Reading> = client.get(&url).send().await?.json().await?;
    assert_eq!(ids(&readings), vec!["r3", "r4"]);

    let url = format!("{}/readings?start_date=2025-03-26&limit=2", base);
    let readings: Vec<Reading> = client.get(&url).send().await?.json().await?;
    assert_eq!(ids(&readings), vec!["r3", "r2"]);

    let url = format!("{}/readings?end_date=2025-03-25", base);
    let readings: Vec<Reading> = client.get(&url).send().await?.json().await?;
    assert_eq!(ids(&readings), vec!["r1"]);

    // A cleared date picker sends blank bounds
    let url = format!("{}/readings?start_date=&end_date=", base);
    let response = client.get(&url).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let readings: Vec<Reading> = response.json().await?;
    assert_eq!(ids(&readings), vec!["r1", "r3", "r2", "r4"]);

    let url = format!("{}/map?start_date=&end_date=2025-03-25", base);
    let layers: MapLayers = client.get(&url).send().await?.json().await?;
    assert_eq!(layers.total_readings, 1);

    let url = format!("{}/readings?start_date=not-a-date", base);
    let response = client.get(&url).send().await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn reading_details_and_not_found() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let details: Details = client
        .get(format!("{}/readings/r2", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(details.id, "r2");
    assert_eq!(details.sensor_name, "Bus 1");
    assert_eq!(details.parsed.latitude, Some(26.85));

    // Unlocated readings are still viewable on their own
    let response = client.get(format!("{}/readings/r5", base)).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let details: Details = response.json().await?;
    assert_eq!(details.sensor_name, "bus-2");

    let response = client.get(format!("{}/readings/missing", base)).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn map_endpoint_samples_markers_and_paths() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let layers: MapLayers = client
        .get(format!("{}/map?show_paths=true", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(layers.total_readings, 4);
    assert_eq!(layers.markers.len(), 4);
    assert_eq!(layers.markers[0].id, "r1");
    assert_eq!(layers.markers[0].sensor_name, "Bus 1");

    assert_eq!(layers.paths.len(), 2);
    assert_eq!(layers.paths[0].sensor_id, "bus-1");
    assert_eq!(layers.paths[0].color, "#FF6B6B");
    assert_eq!(layers.paths[0].vertices, vec![[26.80, 80.90], [26.85, 80.95]]);
    assert_eq!(layers.paths[1].sensor_id, "bus-2");
    assert_eq!(layers.paths[1].color, "#95A5A6");

    let bounds = layers.bounds.expect("bounds for non-empty selection");
    assert_eq!(bounds.south, 26.70);
    assert_eq!(bounds.north, 26.85);

    let hidden: MapLayers = client
        .get(format!("{}/map?sensor_ids=bus-1", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(hidden.paths.is_empty());
    assert_eq!(hidden.total_readings, 2);

    let empty: MapLayers = client
        .get(format!("{}/map?sensor_ids=unknown&show_paths=true", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(empty.total_readings, 0);
    assert!(empty.markers.is_empty() && empty.paths.is_empty() && empty.bounds.is_none());

    Ok(())
}

#[tokio::test]
async fn sensors_summary_and_default_filters() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let sensors: Vec<SensorEntry> = client
        .get(format!("{}/sensors", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0].id, "bus-1");
    assert_eq!(sensors[0].name, "Bus 1");
    assert_eq!(sensors[0].reading_count, 2);
    assert_eq!(sensors[1].name, "bus-2");
    assert_eq!(sensors[1].color, "#95A5A6");
    assert_eq!(sensors[1].reading_count, 3);

    let summary: serde_json::Value = client
        .get(format!("{}/summary", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(summary["totalReadings"], 5);
    assert_eq!(summary["dateRange"]["min"], "2025-03-25T08:00:00Z");

    let defaults: DefaultFilters = client
        .get(format!("{}/filters/default", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(defaults.sensor_ids, vec!["bus-1", "bus-2"]);
    assert_eq!(defaults.start_date.as_deref(), Some("2025-03-25"));
    assert_eq!(defaults.end_date.as_deref(), Some("2025-03-26"));
    assert!(!defaults.show_paths);

    Ok(())
}
