//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::StatsDto, ui::state::AppState};
use hiroba_shared::time::millis_to_jst_rfc3339;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Relay counters and live connection count
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    let hub = &state.hub;
    Json(StatsDto::new(
        hub.connection_count().await,
        hub.active_handlers().await,
        hub.stats(),
        millis_to_jst_rfc3339(hub.started_at()),
    ))
}
