//! Runtime configuration
//!
//! Loaded from TOML at startup; every field has a default, so a missing or
//! unreadable file yields a working configuration.

use crate::metrics::DEFAULT_WINDOW;
use gatelattice_core::{validate_size, Error, GatewayConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Slowest and fastest playback rates, in ticks per second.
pub const MIN_SPEED_HZ: u32 = 1;
pub const MAX_SPEED_HZ: u32 = 60;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    pub automaton: AutomatonConfig,
    pub playback: PlaybackConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomatonConfig {
    /// Lattice side N.
    pub size: usize,
    /// Metrics records retained.
    pub metrics_window: usize,
    /// Fixed RNG seed. Absent means entropy-seeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Ticks per second while playing.
    pub speed_hz: u32,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            size: 9,
            metrics_window: DEFAULT_WINDOW,
            seed: None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { speed_hz: 10 }
    }
}

pub fn validate_speed(speed_hz: u32) -> Result<()> {
    if (MIN_SPEED_HZ..=MAX_SPEED_HZ).contains(&speed_hz) {
        Ok(())
    } else {
        Err(Error::ConfigError(format!(
            "speed {} Hz outside {}..={}",
            speed_hz, MIN_SPEED_HZ, MAX_SPEED_HZ
        )))
    }
}

impl LatticeConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        validate_size(self.automaton.size)?;
        validate_speed(self.playback.speed_hz)?;
        if self.automaton.metrics_window == 0 {
            return Err(Error::ConfigError("metrics_window must be at least 1".into()));
        }
        Ok(())
    }
}
