//! Snapshot persistence
//!
//! The engine only needs a lattice snapshot in and out; where snapshots live
//! is up to the [`SnapshotStore`] implementation. [`MemoryStore`] keeps them
//! in process. An HTTP-backed store lives in `gatelattice-client`.

use chrono::Utc;
use dashmap::DashMap;
use gatelattice_core::{SaveRequest, Snapshot, SnapshotMeta};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot not found: {0}")]
    NotFound(String),

    #[error("invalid snapshot: {0}")]
    Invalid(String),

    /// The backing service could not be reached or failed. Safe to retry.
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Save / list / load of named lattice snapshots.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    fn name(&self) -> &str;

    /// Persist a snapshot and return its metadata.
    async fn save(&self, request: SaveRequest) -> StoreResult<SnapshotMeta>;

    /// All snapshots, newest first.
    async fn list(&self) -> StoreResult<Vec<SnapshotMeta>>;

    async fn load(&self, id: &str) -> StoreResult<Snapshot>;
}

/// Blank names are rejected; surrounding whitespace is trimmed.
pub fn normalize_name(name: &str) -> StoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Invalid("snapshot name is empty".into()));
    }
    Ok(trimmed.to_string())
}

struct Entry {
    seq: u64,
    snapshot: Arc<Snapshot>,
}

/// In-process snapshot store.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    next_seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn new_id(millis: i64) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("state_{}_{}", millis, &suffix[..7])
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, request: SaveRequest) -> StoreResult<SnapshotMeta> {
        let name = normalize_name(&request.name)?;
        let created_at = Utc::now();
        let snapshot = Snapshot {
            id: Self::new_id(created_at.timestamp_millis()),
            name,
            tick: request.tick,
            size: request.lattice.side(),
            lattice: request.lattice,
            created_at,
        };
        let meta = snapshot.meta();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            snapshot.id.clone(),
            Entry {
                seq,
                snapshot: Arc::new(snapshot),
            },
        );
        info!(
            "State saved: \"{}\" (ID: {}). Total states: {}",
            meta.name,
            meta.id,
            self.entries.len()
        );
        Ok(meta)
    }

    async fn list(&self) -> StoreResult<Vec<SnapshotMeta>> {
        let mut metas: Vec<(u64, SnapshotMeta)> = self
            .entries
            .iter()
            .map(|e| (e.seq, e.snapshot.meta()))
            .collect();
        metas.sort_by(|a, b| {
            b.1.created_at
                .cmp(&a.1.created_at)
                .then_with(|| b.0.cmp(&a.0))
        });
        Ok(metas.into_iter().map(|(_, meta)| meta).collect())
    }

    async fn load(&self, id: &str) -> StoreResult<Snapshot> {
        self.entries
            .get(id)
            .map(|e| e.snapshot.as_ref().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
