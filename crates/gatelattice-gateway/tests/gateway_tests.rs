//! Tests for gatelattice-gateway: persistence endpoints, automaton control, playback

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gatelattice_engine::{
    Automaton, FixedSequence, LatticeConfig, MemoryStore, SaveRequest, Snapshot, SnapshotMeta,
    SnapshotStore, StoreError, StoreResult,
};
use gatelattice_gateway::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Store whose backing service is never reachable.
struct OfflineStore;

#[async_trait::async_trait]
impl SnapshotStore for OfflineStore {
    fn name(&self) -> &str {
        "offline"
    }

    async fn save(&self, _request: SaveRequest) -> StoreResult<SnapshotMeta> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn list(&self) -> StoreResult<Vec<SnapshotMeta>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn load(&self, _id: &str) -> StoreResult<Snapshot> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Size-3 automaton whose lattice starts all off.
fn app_with_state() -> (Router, Arc<AppState>) {
    app_with_store(Arc::new(MemoryStore::new()))
}

fn app_with_store(store: Arc<dyn SnapshotStore>) -> (Router, Arc<AppState>) {
    let automaton =
        Automaton::with_source(3, 150, Box::new(FixedSequence::constant(0.0))).unwrap();
    let state = Arc::new(AppState::with_automaton(
        LatticeConfig::default(),
        store,
        automaton,
    ));
    (router(state.clone()), state)
}

fn app() -> Router {
    app_with_state().0
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn zeros(n: usize) -> Value {
    json!(vec![vec![vec![0u8; n]; n]; n])
}

// ===========================================================================
// Persistence
// ===========================================================================

#[tokio::test]
async fn health_reports_current_automaton() {
    let app = app();
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["size"], 3);
    assert_eq!(body["tick"], 0);
    assert_eq!(body["saved"], 0);
}

#[tokio::test]
async fn save_requires_name_tick_and_lattice() {
    let app = app();
    for body in [
        json!({"tick": 1, "lattice": zeros(3)}),
        json!({"name": "a", "lattice": zeros(3)}),
        json!({"name": "a", "tick": 1}),
        json!({"name": "  ", "tick": 1, "lattice": zeros(3)}),
    ] {
        let (status, reply) = call(&app, "POST", "/api/save", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["error"], "Missing name, tick, or lattice data");
    }
}

#[tokio::test]
async fn save_rejects_malformed_lattice() {
    let app = app();
    let body = json!({"name": "bad", "tick": 0, "lattice": [[[0, 2, 0]]]});
    let (status, reply) = call(&app, "POST", "/api/save", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].as_str().unwrap().starts_with("Malformed snapshot"));
}

#[tokio::test]
async fn save_list_and_fetch() {
    let app = app();
    let (status, first) = call(
        &app,
        "POST",
        "/api/save",
        Some(json!({"name": " first ", "tick": 3, "lattice": zeros(3)})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["name"], "first");
    assert_eq!(first["tick"], 3);
    assert_eq!(first["size"], 3);
    assert!(first["id"].as_str().unwrap().starts_with("state_"));
    assert!(first["createdAt"].is_string());

    let (_, second) = call(
        &app,
        "POST",
        "/api/save",
        Some(json!({"name": "second", "timeStep": 8, "lattice": zeros(4)})),
    )
    .await;
    assert_eq!(second["tick"], 8);

    let (status, list) = call(&app, "GET", "/api/saves", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[1]["id"], first["id"]);

    let uri = format!("/api/saves/{}", first["id"].as_str().unwrap());
    let (status, full) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(full["name"], "first");
    assert_eq!(full["lattice"], zeros(3));
}

#[tokio::test]
async fn unknown_snapshot_is_404() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/saves/state_0_missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "State not found"}));
}

// ===========================================================================
// Automaton control
// ===========================================================================

#[tokio::test]
async fn step_defaults_to_one_tick() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/automaton/step", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["steps"], 1);
    assert_eq!(body["tick"], 1);
    // An all-off 3³ lattice turns fully on in one pass.
    assert_eq!(body["records"][0]["delta"], 27);
    assert_eq!(body["records"][0]["energy"], 1.0);

    let (_, status_body) = call(&app, "GET", "/api/automaton", None).await;
    assert_eq!(status_body["tick"], 1);
    assert_eq!(status_body["population"], 27);
}

#[tokio::test]
async fn step_count_is_bounded() {
    let app = app();
    let (status, body) =
        call(&app, "POST", "/api/automaton/step", Some(json!({"count": 5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tick"], 5);
    assert_eq!(body["records"].as_array().unwrap().len(), 5);

    for count in [0, 1001] {
        let (status, _) =
            call(&app, "POST", "/api/automaton/step", Some(json!({"count": count}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn resize_validates_and_restarts() {
    let app = app();
    call(&app, "POST", "/api/automaton/step", None).await;

    let (status, body) =
        call(&app, "POST", "/api/automaton/resize", Some(json!({"size": 5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 5);
    assert_eq!(body["tick"], 0);
    assert_eq!(body["defaultDepth"], 2);

    for size in [2, 16] {
        let (status, _) =
            call(&app, "POST", "/api/automaton/resize", Some(json!({"size": size}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (_, status_body) = call(&app, "GET", "/api/automaton", None).await;
    assert_eq!(status_body["size"], 5);
}

#[tokio::test]
async fn reset_clears_tick_and_metrics() {
    let app = app();
    call(&app, "POST", "/api/automaton/step", Some(json!({"count": 3}))).await;
    let (status, body) = call(&app, "POST", "/api/automaton/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tick"], 0);

    let (_, metrics) = call(&app, "GET", "/api/automaton/metrics", None).await;
    assert_eq!(metrics["records"], json!([]));
    assert_eq!(metrics["capacity"], 150);
}

#[tokio::test]
async fn lattice_and_slice_views() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/automaton/lattice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lattice"], zeros(3));

    let (status, body) = call(&app, "GET", "/api/automaton/slice/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["z"], 1);
    assert_eq!(body["slice"], json!([[0, 0, 0], [0, 0, 0], [0, 0, 0]]));

    let (status, _) = call(&app, "GET", "/api/automaton/slice/3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn kernel_view_lists_gates() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/automaton/kernel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 3);
    assert_eq!(body["gates"][0], json!({"weight": 3, "gate": "XOR"}));
    assert_eq!(body["gates"][3], json!({"weight": 6, "gate": "NOT"}));
    let kernel = body["kernel"].as_array().unwrap();
    assert_eq!(kernel.len(), 3);
    assert!(kernel
        .iter()
        .all(|slice| slice.as_array().unwrap().len() == 3));
}

#[tokio::test]
async fn metrics_csv_download() {
    let app = app();
    call(&app, "POST", "/api/automaton/step", Some(json!({"count": 2}))).await;

    let request = Request::builder()
        .uri("/api/automaton/metrics.csv")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("automaton_metrics_t2.csv"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "t,delta,energy");
    assert_eq!(lines[1], "1,27,1.000000");
    assert_eq!(lines.len(), 3);
}

#[tokio::test]
async fn automaton_save_and_load_round_trip() {
    let app = app();
    call(&app, "POST", "/api/automaton/step", Some(json!({"count": 2}))).await;
    let (_, before) = call(&app, "GET", "/api/automaton/lattice", None).await;

    let (status, meta) = call(
        &app,
        "POST",
        "/api/automaton/save",
        Some(json!({"name": "checkpoint"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(meta["tick"], 2);

    call(&app, "POST", "/api/automaton/resize", Some(json!({"size": 4}))).await;

    let uri = format!("/api/automaton/load/{}", meta["id"].as_str().unwrap());
    let (status, body) = call(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 3);
    assert_eq!(body["tick"], 2);

    let (_, after) = call(&app, "GET", "/api/automaton/lattice", None).await;
    assert_eq!(after["lattice"], before["lattice"]);
}

#[tokio::test]
async fn automaton_save_rejects_blank_name() {
    let app = app();
    let (status, _) = call(&app, "POST", "/api/automaton/save", Some(json!({"name": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn loading_unknown_snapshot_keeps_state() {
    let app = app();
    call(&app, "POST", "/api/automaton/step", None).await;
    let (status, _) = call(&app, "POST", "/api/automaton/load/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = call(&app, "GET", "/api/automaton", None).await;
    assert_eq!(body["tick"], 1);
}

#[tokio::test]
async fn unreachable_store_leaves_automaton_untouched() {
    let (app, _) = app_with_store(Arc::new(OfflineStore));
    call(&app, "POST", "/api/automaton/step", Some(json!({"count": 2}))).await;
    let (_, before) = call(&app, "GET", "/api/automaton/lattice", None).await;

    let (status, body) =
        call(&app, "POST", "/api/automaton/save", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));

    let (status, _) = call(&app, "POST", "/api/automaton/load/state_1_abcdefg", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = call(&app, "GET", "/api/saves", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, after) = call(&app, "GET", "/api/automaton/lattice", None).await;
    assert_eq!(after["tick"], 2);
    assert_eq!(after["lattice"], before["lattice"]);
}

#[tokio::test]
async fn malformed_step_body_is_rejected() {
    let app = app();
    for body in [json!({"count": "x"}), json!("five")] {
        let (status, reply) = call(&app, "POST", "/api/automaton/step", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed request body"));
    }
    let (_, status_body) = call(&app, "GET", "/api/automaton", None).await;
    assert_eq!(status_body["tick"], 0);
}

// ===========================================================================
// Playback
// ===========================================================================

#[tokio::test]
async fn malformed_play_body_is_rejected() {
    let (app, state) = app_with_state();
    let (status, _) =
        call(&app, "POST", "/api/automaton/play", Some(json!({"speed": "fast"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!state.player.is_playing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn play_advances_until_paused() {
    let (app, state) = app_with_state();
    let (status, body) =
        call(&app, "POST", "/api/automaton/play", Some(json!({"speed": 60}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["speedHz"], 60);
    assert!(state.player.is_playing());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (_, body) = call(&app, "POST", "/api/automaton/pause", None).await;
    assert_eq!(body["wasPlaying"], true);
    assert!(!state.player.is_playing());

    let paused_at = state.automaton.lock().await.tick();
    assert!(paused_at > 0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.automaton.lock().await.tick(), paused_at);
}

#[tokio::test]
async fn play_speed_is_bounded() {
    let (app, state) = app_with_state();
    for speed in [0, 61] {
        let (status, _) =
            call(&app, "POST", "/api/automaton/play", Some(json!({"speed": speed}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert!(!state.player.is_playing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_stops_playback() {
    let (app, state) = app_with_state();
    call(&app, "POST", "/api/automaton/play", Some(json!({"speed": 30}))).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (_, body) = call(&app, "POST", "/api/automaton/reset", None).await;
    assert_eq!(body["playing"], false);
    assert_eq!(body["tick"], 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(state.automaton.lock().await.tick(), 0);
}
