//! Snapshot persistence endpoints
//!
//! `POST /api/save`, `GET /api/saves`, `GET /api/saves/:id`.

use crate::error::GatewayError;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gatelattice_core::{SaveRequest, Snapshot, SnapshotMeta};
use serde_json::Value;
use std::sync::Arc;

const MISSING_FIELDS: &str = "Missing name, tick, or lattice data";

/// Body is taken as raw JSON so absent fields produce the documented 400
/// rather than an extractor rejection.
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SnapshotMeta>), GatewayError> {
    let request = parse_save_request(body)?;
    let meta = state.store.save(request).await?;
    Ok((StatusCode::CREATED, Json(meta)))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SnapshotMeta>>, GatewayError> {
    Ok(Json(state.store.list().await?))
}

pub async fn load_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Snapshot>, GatewayError> {
    Ok(Json(state.store.load(&id).await?))
}

fn parse_save_request(body: Value) -> Result<SaveRequest, GatewayError> {
    let name_present = body
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty());
    let tick_present = ["tick", "timeStep"]
        .iter()
        .any(|key| body.get(*key).is_some_and(|v| !v.is_null()));
    let lattice_present = body.get("lattice").is_some_and(|v| !v.is_null());

    if !(name_present && tick_present && lattice_present) {
        return Err(GatewayError::BadRequest(MISSING_FIELDS.into()));
    }

    serde_json::from_value(body)
        .map_err(|e| GatewayError::BadRequest(format!("Malformed snapshot: {}", e)))
}
