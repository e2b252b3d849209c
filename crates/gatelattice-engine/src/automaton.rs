//! Automaton runtime: owns the lattice, kernel volume, tick counter and metrics

use crate::config::AutomatonConfig;
use crate::evolve::Evolver;
use crate::kernel::build_kernel_volume;
use crate::lattice::init_lattice;
use crate::metrics::MetricsWindow;
use crate::random::{source_from_seed, RandomSource};
use crate::store::{normalize_name, StoreResult};
use gatelattice_core::{
    validate_size, Error, KernelVolume, Lattice, LatticeSlice, MetricsRecord, Result, SaveRequest,
    Snapshot,
};
use std::sync::Arc;
use tracing::{debug, info};

/// The running automaton.
///
/// The current lattice is held behind an `Arc` and swapped wholesale once a
/// pass has fully succeeded; a failed step leaves lattice and tick untouched.
pub struct Automaton {
    tick: u64,
    evolver: Arc<Evolver>,
    lattice: Arc<Lattice>,
    metrics: MetricsWindow,
    rng: Box<dyn RandomSource>,
}

impl Automaton {
    pub fn new(config: &AutomatonConfig) -> Result<Self> {
        Self::with_source(
            config.size,
            config.metrics_window,
            source_from_seed(config.seed),
        )
    }

    pub fn with_source(
        size: usize,
        metrics_window: usize,
        mut rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let evolver = Self::build_evolver(size)?;
        let lattice = init_lattice(size, rng.as_mut())?;
        info!("Automaton created: {}³ lattice", size);
        Ok(Self {
            tick: 0,
            evolver: Arc::new(evolver),
            lattice: Arc::new(lattice),
            metrics: MetricsWindow::new(metrics_window),
            rng,
        })
    }

    fn build_evolver(size: usize) -> Result<Evolver> {
        let kernel = build_kernel_volume(size)?;
        Evolver::new(Arc::new(kernel))
    }

    pub fn size(&self) -> usize {
        self.evolver.size()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn lattice(&self) -> Arc<Lattice> {
        self.lattice.clone()
    }

    pub fn kernel(&self) -> &Arc<KernelVolume> {
        self.evolver.kernel()
    }

    pub fn metrics(&self) -> &MetricsWindow {
        &self.metrics
    }

    /// Depth slice shown by default: the middle layer.
    pub fn default_depth(&self) -> usize {
        self.size() / 2
    }

    pub fn slice(&self, z: usize) -> Result<LatticeSlice> {
        self.lattice.slice(z)
    }

    /// Advance one tick.
    pub fn step(&mut self) -> Result<MetricsRecord> {
        let transition = self.evolver.evolve(&self.lattice, self.rng.as_mut())?;
        let tick = self.tick + 1;
        let record = transition.record(tick);
        self.lattice = Arc::new(transition.next);
        self.tick = tick;
        self.metrics.push(record.clone());
        debug!(tick, delta = record.delta, energy = record.energy, "tick");
        Ok(record)
    }

    /// Re-seed the lattice at the current size. The kernel volume is kept.
    pub fn reset(&mut self) -> Result<()> {
        let lattice = init_lattice(self.size(), self.rng.as_mut())?;
        self.lattice = Arc::new(lattice);
        self.tick = 0;
        self.metrics.clear();
        info!("Automaton reset: {}³ lattice", self.size());
        Ok(())
    }

    /// Replace lattice and kernel volume with fresh ones of side `size`.
    pub fn resize(&mut self, size: usize) -> Result<()> {
        validate_size(size)?;
        let evolver = Self::build_evolver(size)?;
        let lattice = init_lattice(size, self.rng.as_mut())?;
        self.evolver = Arc::new(evolver);
        self.lattice = Arc::new(lattice);
        self.tick = 0;
        self.metrics.clear();
        info!("Automaton resized: {}³ lattice", size);
        Ok(())
    }

    /// Make `lattice` current at `tick`, rebuilding the kernel volume if the
    /// side changes. Nothing is modified unless the lattice is acceptable.
    pub fn adopt(&mut self, tick: u64, lattice: Lattice) -> Result<()> {
        let size = lattice.side();
        validate_size(size)?;
        if size != self.size() {
            self.evolver = Arc::new(Self::build_evolver(size)?);
        }
        self.lattice = Arc::new(lattice);
        self.tick = tick;
        self.metrics.clear();
        info!("Automaton adopted snapshot: {}³ lattice at tick {}", size, tick);
        Ok(())
    }

    /// Adopt a loaded snapshot, checking its declared size when present.
    pub fn adopt_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        if snapshot.size != 0 && snapshot.size != snapshot.lattice.side() {
            return Err(Error::mismatch(
                "snapshot lattice side",
                snapshot.size,
                snapshot.lattice.side(),
            ));
        }
        self.adopt(snapshot.tick, snapshot.lattice)
    }

    /// Save request for the current state.
    pub fn save_request(&self, name: &str) -> StoreResult<SaveRequest> {
        Ok(SaveRequest {
            name: normalize_name(name)?,
            tick: self.tick,
            lattice: self.lattice.as_ref().clone(),
        })
    }
}

impl std::fmt::Debug for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automaton")
            .field("size", &self.size())
            .field("tick", &self.tick)
            .field("metrics", &self.metrics.len())
            .finish()
    }
}
