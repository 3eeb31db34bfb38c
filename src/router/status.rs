//! Instance status route.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::config::Configuration;

/// `GET /status.json` returns the public instance configuration.
pub async fn handler(
    State(config): State<Arc<Configuration>>,
) -> Json<Configuration> {
    Json((*config).clone())
}
