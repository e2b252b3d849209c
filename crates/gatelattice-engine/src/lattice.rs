//! Lattice seeding

use crate::random::RandomSource;
use gatelattice_core::{validate_size, CellState, Lattice, Result};

/// A cell starts alive when its draw exceeds this value (p = 0.25).
pub const SEED_THRESHOLD: f64 = 0.75;

/// Fresh N×N×N lattice with one independent draw per cell, taken in z, y, x order.
pub fn init_lattice(size: usize, rng: &mut dyn RandomSource) -> Result<Lattice> {
    validate_size(size)?;
    Ok(Lattice::from_fn(size, |_, _, _| {
        if rng.next_unit() > SEED_THRESHOLD {
            CellState::On
        } else {
            CellState::Off
        }
    }))
}
