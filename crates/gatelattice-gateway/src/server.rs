//! Gateway server: snapshot persistence plus a shared automaton under HTTP control

use crate::control;
use crate::player::Player;
use crate::saves;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gatelattice_engine::{Automaton, LatticeConfig, MemoryStore, SnapshotStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Request bodies carry whole lattices; allow generous payloads.
pub const BODY_LIMIT: usize = 50 * 1024 * 1024;

pub struct AppState {
    pub automaton: Arc<Mutex<Automaton>>,
    pub store: Arc<dyn SnapshotStore>,
    pub player: Player,
    pub config: LatticeConfig,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(
        config: LatticeConfig,
        store: Arc<dyn SnapshotStore>,
    ) -> gatelattice_core::Result<Self> {
        let automaton = Automaton::new(&config.automaton)?;
        Ok(Self::with_automaton(config, store, automaton))
    }

    pub fn with_automaton(
        config: LatticeConfig,
        store: Arc<dyn SnapshotStore>,
        automaton: Automaton,
    ) -> Self {
        Self {
            automaton: Arc::new(Mutex::new(automaton)),
            store,
            player: Player::new(),
            config,
            started_at: std::time::Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/save", post(saves::save_handler))
        .route("/api/saves", get(saves::list_handler))
        .route("/api/saves/:id", get(saves::load_handler))
        .route("/api/automaton", get(control::status_handler))
        .route("/api/automaton/step", post(control::step_handler))
        .route("/api/automaton/reset", post(control::reset_handler))
        .route("/api/automaton/resize", post(control::resize_handler))
        .route("/api/automaton/lattice", get(control::lattice_handler))
        .route("/api/automaton/slice/:z", get(control::slice_handler))
        .route("/api/automaton/kernel", get(control::kernel_handler))
        .route("/api/automaton/metrics", get(control::metrics_handler))
        .route("/api/automaton/metrics.csv", get(control::metrics_csv_handler))
        .route("/api/automaton/play", post(control::play_handler))
        .route("/api/automaton/pause", post(control::pause_handler))
        .route("/api/automaton/save", post(control::save_handler))
        .route("/api/automaton/load/:id", post(control::load_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_gateway(config: LatticeConfig) -> anyhow::Result<()> {
    config.validate()?;
    let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config.clone(), store)?);
    let app = router(state.clone());

    let bind_addr: SocketAddr =
        format!("{}:{}", config.gateway.bind.to_addr(), config.gateway.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address: {}", e))?;

    info!("Gatelattice Gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Lattice:      {}³", config.automaton.size);
    info!("  Store:        {}", state.store.name());
    if let Some(seed) = config.automaton.seed {
        info!("  Seed:         {}", seed);
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    state.player.stop();
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let saved = state.store.list().await.map(|l| l.len()).ok();
    let (size, tick) = {
        let automaton = state.automaton.lock().await;
        (automaton.size(), automaton.tick())
    };
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "size": size,
        "tick": tick,
        "playing": state.player.is_playing(),
        "store": state.store.name(),
        "saved": saved,
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}
