//! Timed playback
//!
//! A running [`Player`] steps the shared automaton at a fixed rate until it
//! is paused, replaced, or a step fails. Each step runs on the blocking pool
//! while holding the automaton lock, so a reset or load issued mid-tick waits
//! for that tick to finish and then sees the playback already cancelled.

use gatelattice_core::Result;
use gatelattice_engine::config::validate_speed;
use gatelattice_engine::Automaton;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Playback {
    speed_hz: u32,
    cancel: CancellationToken,
}

#[derive(Default)]
pub struct Player {
    current: std::sync::Mutex<Option<Playback>>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> std::sync::MutexGuard<'_, Option<Playback>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start stepping at `speed_hz`, replacing any playback already running.
    pub fn start(&self, automaton: Arc<Mutex<Automaton>>, speed_hz: u32) -> Result<()> {
        validate_speed(speed_hz)?;
        let cancel = CancellationToken::new();
        let previous = self.current().replace(Playback {
            speed_hz,
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        info!("Playback started at {} Hz", speed_hz);
        tokio::spawn(run_playback(automaton, speed_hz, cancel));
        Ok(())
    }

    /// Cancel playback. Returns whether anything was playing.
    pub fn stop(&self) -> bool {
        match self.current().take() {
            Some(playback) => {
                let was_playing = !playback.cancel.is_cancelled();
                playback.cancel.cancel();
                if was_playing {
                    info!("Playback paused");
                }
                was_playing
            }
            None => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current()
            .as_ref()
            .is_some_and(|p| !p.cancel.is_cancelled())
    }

    /// Rate of the running playback, if any.
    pub fn speed_hz(&self) -> Option<u32> {
        self.current()
            .as_ref()
            .filter(|p| !p.cancel.is_cancelled())
            .map(|p| p.speed_hz)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_playback(
    automaton: Arc<Mutex<Automaton>>,
    speed_hz: u32,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / speed_hz as f64));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let automaton = automaton.clone();
        let step_cancel = cancel.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut automaton = automaton.blocking_lock();
            // Whoever cancelled may have changed the lattice while we waited.
            if step_cancel.is_cancelled() {
                return None;
            }
            Some(automaton.step())
        })
        .await;

        match outcome {
            Ok(None) => break,
            Ok(Some(Ok(record))) => {
                debug!(tick = record.tick, delta = record.delta, "Playback tick");
            }
            Ok(Some(Err(e))) => {
                warn!("Playback stopped, step failed: {}", e);
                cancel.cancel();
                break;
            }
            Err(e) => {
                warn!("Playback stopped, worker failed: {}", e);
                cancel.cancel();
                break;
            }
        }
    }
    debug!("Playback loop exited");
}
