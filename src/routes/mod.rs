//! Route gateway: merges every endpoint subrouter and binds the shared state.
//!
//! Handlers see only [`AppState`]; they do not know how the dataset was loaded.

use std::sync::Arc;

use axum::Router;

use crate::{Config, Dataset};

mod health;
mod map;
mod query;
mod readings;
mod sensors;

use query::{blank_date, criteria_from_query};

/// Immutable dataset plus configuration, cloned into every handler.
pub type AppState = (Arc<Dataset>, Config);

// ---

pub fn router(dataset: Arc<Dataset>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(map::router())
        .merge(sensors::router())
        .merge(health::router())
        .with_state((dataset, config))
}
