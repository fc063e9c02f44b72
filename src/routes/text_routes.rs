use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::services::text_service;
use crate::state::app::AppState;
use crate::store::HistoryRecord;

/// Default number of history records when the caller gives no limit.
const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Build the Text API routes.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/text", get(get_all_text))
        // Static segment, so it wins over /text/:key below.
        .route("/text/reset-all", post(reset_all_text))
        .route("/text/:key", post(set_text))
        .route("/history", get(get_history))
        .with_state(state)
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/text
// Current value of every known key
// ─────────────────────────────────────────────────────────────
//
async fn get_all_text(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(text_service::get_all(&state.store)?))
}

//
// ─────────────────────────────────────────────────────────────
// POST /api/text/{key}
// Commit one edit and broadcast it
// ─────────────────────────────────────────────────────────────
//
#[derive(Debug, Deserialize)]
struct SetBody {
    value: Option<String>,
}

async fn set_text(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<SetBody>,
) -> Result<Json<Value>, ApiError> {
    let value = body.value.unwrap_or_default();

    text_service::set(&state.store, &state.updates, &key, &value)?;

    Ok(Json(json!({
        "success": true,
        "key": key,
        "value": value,
    })))
}

//
// ─────────────────────────────────────────────────────────────
// POST /api/text/reset-all
// Overwrite every key back to its built-in default
// ─────────────────────────────────────────────────────────────
//
async fn reset_all_text(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    text_service::reset_all(&state.store)?;

    Ok(Json(json!({
        "success": true,
        "message": "All text reset to defaults",
    })))
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/history?limit=100
// Most recent writes across all keys, newest first
// ─────────────────────────────────────────────────────────────
//
#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn get_history(
    Query(params): Query<HistoryParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(text_service::history(&state.store, limit)?))
}
