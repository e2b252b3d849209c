//! Automaton control endpoints
//!
//! Stepping runs on the blocking pool since one pass over a 15³ lattice is
//! real work. Snapshot I/O never happens while the automaton lock is held.

use crate::error::GatewayError;
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use gatelattice_core::{MetricsRecord, SnapshotMeta, GATE_TABLE};
use gatelattice_engine::Automaton;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Most ticks a single step request may advance.
pub const MAX_STEP_COUNT: u32 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct StepRequest {
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub size: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    pub speed: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NamedSave {
    #[serde(default)]
    pub name: String,
}

/// An empty body selects the defaults; anything else must parse.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::BadRequest(format!("Malformed request body: {}", e)))
}

fn status_body(automaton: &Automaton, state: &AppState) -> Value {
    let lattice = automaton.lattice();
    json!({
        "size": automaton.size(),
        "tick": automaton.tick(),
        "defaultDepth": automaton.default_depth(),
        "population": lattice.population(),
        "energy": lattice.energy(),
        "latest": automaton.metrics().latest(),
        "playing": state.player.is_playing(),
        "speedHz": state.player.speed_hz(),
    })
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let automaton = state.automaton.lock().await;
    Json(status_body(&automaton, &state))
}

pub async fn step_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    let count = optional_body::<StepRequest>(&body)?.count.unwrap_or(1);
    if count == 0 || count > MAX_STEP_COUNT {
        return Err(GatewayError::BadRequest(format!(
            "count must be within 1..={}",
            MAX_STEP_COUNT
        )));
    }

    let automaton = state.automaton.clone();
    let records = tokio::task::spawn_blocking(move || {
        let mut automaton = automaton.blocking_lock();
        (0..count)
            .map(|_| automaton.step())
            .collect::<gatelattice_core::Result<Vec<MetricsRecord>>>()
    })
    .await??;

    Ok(Json(json!({
        "steps": records.len(),
        "tick": records.last().map(|r| r.tick),
        "records": records,
    })))
}

pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, GatewayError> {
    state.player.stop();
    let mut automaton = state.automaton.lock().await;
    automaton.reset()?;
    Ok(Json(status_body(&automaton, &state)))
}

pub async fn resize_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResizeRequest>,
) -> Result<Json<Value>, GatewayError> {
    gatelattice_core::validate_size(body.size)?;
    state.player.stop();
    let mut automaton = state.automaton.lock().await;
    automaton.resize(body.size)?;
    Ok(Json(status_body(&automaton, &state)))
}

pub async fn lattice_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (tick, lattice) = {
        let automaton = state.automaton.lock().await;
        (automaton.tick(), automaton.lattice())
    };
    Json(json!({
        "size": lattice.side(),
        "tick": tick,
        "lattice": &*lattice,
    }))
}

pub async fn slice_handler(
    State(state): State<Arc<AppState>>,
    Path(z): Path<usize>,
) -> Result<Json<Value>, GatewayError> {
    let (tick, lattice) = {
        let automaton = state.automaton.lock().await;
        (automaton.tick(), automaton.lattice())
    };
    let slice = lattice.slice(z)?;
    Ok(Json(json!({
        "z": z,
        "size": lattice.side(),
        "tick": tick,
        "slice": slice,
    })))
}

pub async fn kernel_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let kernel = state.automaton.lock().await.kernel().clone();
    let gates: Vec<Value> = GATE_TABLE
        .iter()
        .map(|(weight, gate)| json!({ "weight": weight.value(), "gate": gate }))
        .collect();
    Json(json!({
        "size": kernel.side(),
        "gates": gates,
        "kernel": &*kernel,
    }))
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let automaton = state.automaton.lock().await;
    let metrics = automaton.metrics();
    Json(json!({
        "capacity": metrics.capacity(),
        "records": metrics.to_vec(),
    }))
}

pub async fn metrics_csv_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (csv, file_name) = {
        let automaton = state.automaton.lock().await;
        (automaton.metrics().to_csv(), automaton.metrics().export_file_name())
    };
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        csv,
    )
}

pub async fn play_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    let speed = optional_body::<PlayRequest>(&body)?
        .speed
        .unwrap_or(state.config.playback.speed_hz);
    state.player.start(state.automaton.clone(), speed)?;
    Ok(Json(json!({ "playing": true, "speedHz": speed })))
}

pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let was_playing = state.player.stop();
    Json(json!({ "playing": false, "wasPlaying": was_playing }))
}

pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NamedSave>,
) -> Result<(StatusCode, Json<SnapshotMeta>), GatewayError> {
    let request = state.automaton.lock().await.save_request(&body.name)?;
    let meta = state.store.save(request).await?;
    Ok((StatusCode::CREATED, Json(meta)))
}

pub async fn load_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let snapshot = state.store.load(&id).await?;
    let name = snapshot.name.clone();
    state.player.stop();
    let mut automaton = state.automaton.lock().await;
    automaton.adopt_snapshot(snapshot)?;
    info!("Loaded snapshot \"{}\" ({})", name, id);
    Ok(Json(status_body(&automaton, &state)))
}
