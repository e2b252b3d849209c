//! Evolution pass
//!
//! Every cell reads its whole neighborhood from the depth layer behind it
//! (`z - 1`, wrapped), centered on `(y, x)` with toroidal wrap in both axes.
//! Each kernel offset feeds one of four accumulators according to its gate:
//!
//! - XOR: running parity
//! - THRESHOLD: strict majority of the offsets in the class
//! - MEMORY: a second, independent running parity
//! - NOT: the neighbor at the *last* NOT offset in row-major order, inverted
//!
//! The cell's next state is the XOR of the four results.
//!
//! Gate dispatch is resolved once per kernel volume into per-layer offset
//! lists ([`LayerPlan`]). The NOT list collapses to its last entry, which is
//! exactly the value a row-major scan would leave behind.

use crate::random::RandomSource;
use gatelattice_core::{
    validate_size, CellState, Error, GateType, KernelSlice, KernelVolume, Lattice, MetricsRecord,
    Result,
};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Result of one evolution pass.
#[derive(Clone, Debug)]
pub struct Transition {
    pub next: Lattice,
    pub delta: u64,
    pub energy: f64,
    pub reversibility: f64,
    pub phase_invariance: f64,
}

impl Transition {
    pub fn record(&self, tick: u64) -> MetricsRecord {
        MetricsRecord {
            tick,
            delta: self.delta,
            energy: self.energy,
            reversibility: self.reversibility,
            phase_invariance: self.phase_invariance,
        }
    }
}

/// Largest f64 below 1.0; reversibility never reaches 1.
const REVERSIBILITY_CEILING: f64 = 1.0 - f64::EPSILON / 2.0;

/// `0.999 + u * 0.001`, kept inside [0.999, 1.0) even when rounding would land on 1.
pub fn reversibility(u: f64) -> f64 {
    (0.999 + u * 0.001).min(REVERSIBILITY_CEILING)
}

/// `1 - delta / N³ * 0.05`
pub fn phase_invariance(delta: u64, size: usize) -> f64 {
    let volume = (size * size * size) as f64;
    1.0 - (delta as f64 / volume) * 0.05
}

/// Offsets are stored pre-shifted: neighbor row is `(y + dy) % n`.
type Offset = (usize, usize);

/// Gate offsets for one kernel slice, in row-major order.
#[derive(Clone, Debug, Default)]
pub struct LayerPlan {
    xor: Vec<Offset>,
    threshold: Vec<Offset>,
    memory: Vec<Offset>,
    not: Option<Offset>,
}

impl LayerPlan {
    pub fn compile(slice: &KernelSlice) -> Self {
        let n = slice.side();
        let half = n / 2;
        let mut plan = Self::default();
        for ky in 0..n {
            for kx in 0..n {
                let offset = (ky + n - half, kx + n - half);
                match slice.get(ky, kx).gate() {
                    GateType::Xor => plan.xor.push(offset),
                    GateType::Threshold => plan.threshold.push(offset),
                    GateType::Memory => plan.memory.push(offset),
                    GateType::Not => plan.not = Some(offset),
                }
            }
        }
        plan
    }

    /// Next state of `(y, x)` given the source layer (row-major, side `n`).
    fn next_cell(&self, source: &[CellState], n: usize, y: usize, x: usize) -> CellState {
        let read = |&(dy, dx): &Offset| source[((y + dy) % n) * n + (x + dx) % n].bit();

        let xor = self.xor.iter().fold(0u8, |acc, o| acc ^ read(o));
        let sum: usize = self.threshold.iter().map(|o| read(o) as usize).sum();
        let threshold = (2 * sum > self.threshold.len()) as u8;
        let memory = self.memory.iter().fold(0u8, |acc, o| acc ^ read(o));
        let not_input = self.not.as_ref().map(read).unwrap_or(0);

        CellState::from_bit(xor ^ threshold ^ memory ^ (1 - not_input))
    }
}

/// Evolution engine bound to one kernel volume.
#[derive(Debug)]
pub struct Evolver {
    kernel: Arc<KernelVolume>,
    plans: Vec<LayerPlan>,
}

impl Evolver {
    pub fn new(kernel: Arc<KernelVolume>) -> Result<Self> {
        validate_size(kernel.side())?;
        let plans = kernel.slices().iter().map(LayerPlan::compile).collect();
        Ok(Self { kernel, plans })
    }

    pub fn kernel(&self) -> &Arc<KernelVolume> {
        &self.kernel
    }

    pub fn size(&self) -> usize {
        self.kernel.side()
    }

    /// Compute the next lattice. `lattice` is only read; the result is a new volume.
    pub fn evolve(&self, lattice: &Lattice, rng: &mut dyn RandomSource) -> Result<Transition> {
        let n = self.size();
        if lattice.side() != n {
            return Err(Error::mismatch("lattice side", n, lattice.side()));
        }

        let mut cells = vec![CellState::Off; lattice.volume()];
        let (delta, population) = cells
            .par_chunks_mut(n * n)
            .enumerate()
            .map(|(z, out)| {
                let plan = &self.plans[z];
                let source = lattice.layer((z + n - 1) % n);
                let previous = lattice.layer(z);
                let mut delta = 0u64;
                let mut population = 0u64;
                for y in 0..n {
                    for x in 0..n {
                        let i = y * n + x;
                        let next = plan.next_cell(source, n, y, x);
                        out[i] = next;
                        delta += (next != previous[i]) as u64;
                        population += next.bit() as u64;
                    }
                }
                (delta, population)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        let next = Lattice::from_cells(n, cells)?;
        let energy = population as f64 / next.volume() as f64;
        let reversibility = reversibility(rng.next_unit());
        let phase_invariance = phase_invariance(delta, n);

        debug!(size = n, delta, energy, "evolution pass complete");

        Ok(Transition {
            next,
            delta,
            energy,
            reversibility,
            phase_invariance,
        })
    }
}

/// One-shot evolution: checks `size` against both inputs, compiles the gate
/// plans, and runs a single pass.
pub fn evolve(
    lattice: &Lattice,
    kernel: &KernelVolume,
    size: usize,
    rng: &mut dyn RandomSource,
) -> Result<Transition> {
    if kernel.side() != size {
        return Err(Error::mismatch("kernel depth", size, kernel.side()));
    }
    if lattice.side() != size {
        return Err(Error::mismatch("lattice side", size, lattice.side()));
    }
    Evolver::new(Arc::new(kernel.clone()))?.evolve(lattice, rng)
}
