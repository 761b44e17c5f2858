//! Configuration loader for the `codemetal-fleetmap` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;

use anyhow::{anyhow, Result};
use chrono::FixedOffset;

/// Parse an optional unsigned integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional signed integer environment variable with a default value.
macro_rules! parse_env_i32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<i32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Summary document location (http(s) URL or local path).
    pub summary_source: String,

    /// Readings document location (http(s) URL or local path).
    pub readings_source: String,

    /// Optional sensor name/color table.
    pub sensor_directory_path: Option<String>,

    /// Per-document fetch timeout in seconds.
    pub fetch_timeout_secs: u32,

    /// Offset defining the viewer's calendar for date filtering.
    pub viewer_offset: FixedOffset,

    /// HTTP listen port.
    pub listen_port: u16,

    /// Default and maximum number of readings per `/readings` response.
    pub readings_limit_max: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SUMMARY_SOURCE` – summary document URL or path
/// - `READINGS_SOURCE` – readings document URL or path
///
/// Optional:
/// - `SENSOR_DIRECTORY_PATH` – sensor directory JSON file (default: none)
/// - `FETCH_TIMEOUT_SECS` – fetch timeout (default: 120)
/// - `VIEWER_UTC_OFFSET_MINUTES` – viewer calendar offset (default: 0)
/// - `LISTEN_PORT` – HTTP port (default: 8080)
/// - `READINGS_LIMIT_MAX` – readings per response (default: 1000)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let summary_source = require_env!("SUMMARY_SOURCE");
    let readings_source = require_env!("READINGS_SOURCE");
    let sensor_directory_path = env::var("SENSOR_DIRECTORY_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty());
    let fetch_timeout_secs = parse_env_u32!("FETCH_TIMEOUT_SECS", 120);
    let offset_minutes = parse_env_i32!("VIEWER_UTC_OFFSET_MINUTES", 0);
    let listen_port = parse_env_u32!("LISTEN_PORT", 8080);
    let readings_limit_max = parse_env_u32!("READINGS_LIMIT_MAX", 1000);

    let viewer_offset = viewer_offset_from_minutes(offset_minutes)?;
    let listen_port = u16::try_from(listen_port)
        .map_err(|_| anyhow!("Invalid LISTEN_PORT: {} is out of range", listen_port))?;

    Ok(Config {
        summary_source,
        readings_source,
        sensor_directory_path,
        fetch_timeout_secs,
        viewer_offset,
        listen_port,
        readings_limit_max,
    })
}

/// Convert a minute offset into a [`FixedOffset`], rejecting anything past ±24h.
pub fn viewer_offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    // ---
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow!("Invalid VIEWER_UTC_OFFSET_MINUTES: {} is out of range", minutes))
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SUMMARY_SOURCE            : {}", self.summary_source);
        tracing::info!("  READINGS_SOURCE           : {}", self.readings_source);
        tracing::info!(
            "  SENSOR_DIRECTORY_PATH     : {}",
            self.sensor_directory_path.as_deref().unwrap_or("<none>")
        );
        tracing::info!("  FETCH_TIMEOUT_SECS        : {}", self.fetch_timeout_secs);
        tracing::info!("  VIEWER_UTC_OFFSET         : {}", self.viewer_offset);
        tracing::info!("  LISTEN_PORT               : {}", self.listen_port);
        tracing::info!("  READINGS_LIMIT_MAX        : {}", self.readings_limit_max);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_viewer_offset_from_minutes() {
        // ---
        assert_eq!(viewer_offset_from_minutes(0).unwrap().local_minus_utc(), 0);
        assert_eq!(viewer_offset_from_minutes(330).unwrap().local_minus_utc(), 19_800);
        assert_eq!(viewer_offset_from_minutes(-300).unwrap().local_minus_utc(), -18_000);
    }

    #[test]
    fn test_viewer_offset_out_of_range() {
        // ---
        assert!(viewer_offset_from_minutes(24 * 60).is_err());
        assert!(viewer_offset_from_minutes(i32::MAX).is_err());
    }
}
