//! Document loader for the two telemetry documents and the sensor directory.
//!
//! Sources are http(s) URLs fetched with `reqwest`, or local file paths.
//! Everything loaded here is immutable afterwards and shared by the routes
//! through [`Dataset`].

use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::directory::SensorDirectory;
use crate::models::{CanonicalRecord, SensorSummary};
use crate::Config;

// ---

/// In-memory snapshot served by the API.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub summary: SensorSummary,
    pub readings: Vec<CanonicalRecord>,
    pub directory: SensorDirectory,
}

impl Dataset {
    // ---
    pub fn new(summary: SensorSummary, readings: Vec<CanonicalRecord>, directory: SensorDirectory) -> Self {
        Self { summary, readings, directory }
    }

    pub fn find(&self, id: &str) -> Option<&CanonicalRecord> {
        self.readings.iter().find(|r| r.id == id)
    }

    /// Log mismatches between the summary, the readings and the directory.
    ///
    /// Returns the number of warnings emitted.
    pub fn check_consistency(&self) -> usize {
        // ---
        let mut warnings = 0;

        if self.summary.total_readings != self.readings.len() as u64 {
            warn!(
                "Summary reports {} readings but {} were loaded",
                self.summary.total_readings,
                self.readings.len()
            );
            warnings += 1;
        }

        for sensor_id in &self.summary.unique_sensor_ids {
            if !self.directory.contains(sensor_id) {
                warn!("Sensor {} is not in the sensor directory, showing raw id", sensor_id);
                warnings += 1;
            }
        }

        warnings
    }
}

/// Load summary, readings and directory in that order.
pub async fn load_dataset(config: &Config) -> Result<Dataset> {
    // ---
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(config.fetch_timeout_secs)))
        .build()
        .context("Failed to build HTTP client")?;

    info!("Loading summary from {}", config.summary_source);
    let summary_text = load_source(&client, &config.summary_source).await?;
    let summary = parse_summary(&summary_text)
        .with_context(|| format!("Invalid summary document from {}", config.summary_source))?;

    info!("Loading sensor readings from {}", config.readings_source);
    let readings_text = load_source(&client, &config.readings_source).await?;
    debug!("Readings document is {} bytes", readings_text.len());
    let readings = parse_readings(&readings_text)
        .with_context(|| format!("Invalid readings document from {}", config.readings_source))?;

    let directory = match &config.sensor_directory_path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read sensor directory {}", path))?;
            SensorDirectory::from_json(&text)
                .with_context(|| format!("Invalid sensor directory {}", path))?
        }
        None => SensorDirectory::default(),
    };

    info!(
        "Loaded {} readings for {} sensors ({} in directory)",
        readings.len(),
        summary.unique_sensor_ids.len(),
        directory.len()
    );

    let dataset = Dataset::new(summary, readings, directory);
    dataset.check_consistency();
    Ok(dataset)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch a document body from a URL, or read it from disk.
pub async fn load_source(client: &reqwest::Client, source: &str) -> Result<String> {
    // ---
    if !is_remote(source) {
        return tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read {}", source));
    }

    let response = client
        .get(source)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", source))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Failed to fetch {}: {}", source, status);
    }

    if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or_default();
        if !content_type.contains("application/json") {
            warn!("Unexpected content type from {}: {}", source, content_type);
        }
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", source))
}

pub fn parse_summary(text: &str) -> Result<SensorSummary> {
    Ok(serde_json::from_str(text)?)
}

/// Parse the readings document, repairing the known export artefact first.
pub fn parse_readings(text: &str) -> Result<Vec<CanonicalRecord>> {
    // ---
    let cleaned = clean_export_artifacts(text);
    if let Cow::Owned(_) = cleaned {
        warn!("Found \",git\" export artefact in readings document, cleaned");
    }

    let value: serde_json::Value = serde_json::from_str(&cleaned).context("Malformed JSON")?;
    if !value.is_array() {
        bail!("Sensor readings data is not in the expected format (expected array)");
    }

    Ok(serde_json::from_value(value)?)
}

/// Replace every `,git` followed by optional whitespace and a newline with `,\n`.
pub fn clean_export_artifacts(text: &str) -> Cow<'_, str> {
    // ---
    static ARTIFACT: OnceLock<Regex> = OnceLock::new();
    let pattern = ARTIFACT.get_or_init(|| Regex::new(r",git\s*\n").expect("static pattern"));
    pattern.replace_all(text, ",\n")
}
