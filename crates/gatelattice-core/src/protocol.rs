//! Snapshot persistence wire format
//!
//! Client → Server (save):
//!   POST /api/save  { "name": "glider", "tick": 12, "lattice": [[[0,1,...],...],...] }
//!
//! Server → Client (saved metadata):
//!   { "id": "state_...", "name": "glider", "tick": 12, "size": 9, "createdAt": "2026-..." }
//!
//! Server → Client (full record):
//!   { "id": "...", "name": "...", "tick": 12, "size": 9, "lattice": [...], "createdAt": "..." }
//!
//! Errors:
//!   { "error": "State not found" }
//!
//! Older clients send `timeStep` instead of `tick`; both are accepted.

use crate::types::Lattice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Save request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub name: String,
    #[serde(alias = "timeStep")]
    pub tick: u64,
    pub lattice: Lattice,
}

/// Listing entry for a saved snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub id: String,
    pub name: String,
    #[serde(alias = "timeStep")]
    pub tick: u64,
    #[serde(default)]
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

/// A saved snapshot including its lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    #[serde(alias = "timeStep")]
    pub tick: u64,
    #[serde(default)]
    pub size: usize,
    pub lattice: Lattice,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn meta(&self) -> SnapshotMeta {
        SnapshotMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            tick: self.tick,
            size: self.lattice.side(),
            created_at: self.created_at,
        }
    }
}

/// Error body returned by the HTTP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
