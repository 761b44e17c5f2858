//! Fleet telemetry map backend.
//!
//! The pure pipeline turns raw device readings into map-ready data:
//! - [`resolver`] resolves overlapping payload keys into one measurement set
//! - [`normalize`] attaches that set to a canonical record
//! - [`select`] filters by sensor and calendar date and orders by time
//! - [`sampler`] decimates the result into markers and per-sensor paths
//! - [`directory`] maps sensor ids to display names and colors
//!
//! Around it, [`ingest`] loads the source documents and [`routes`] serves
//! the results over HTTP. This crate follows the Explicit Module Boundary
//! Pattern (EMBP): modules talk to each other only through the re-exports
//! below.

pub mod config;
pub mod directory;
pub mod filter;
pub mod ingest;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod sampler;

pub use config::Config;
pub use directory::SensorDirectory;
pub use filter::{select, FilterCriteria};
pub use ingest::{load_dataset, Dataset};
pub use models::{
    normalize, CanonicalRecord, Measurements, NormalizedRecord, PathSegment, RawPayload,
    SensorSummary,
};
pub use sampler::{map_layers, sample_markers, sample_paths, MapLayers};
