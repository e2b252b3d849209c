//! Gatelattice Engine - kernel construction, lattice evolution, and the automaton runtime

pub mod automaton;
pub mod config;
pub mod evolve;
pub mod kernel;
pub mod lattice;
pub mod metrics;
pub mod random;
pub mod store;

pub use automaton::Automaton;
pub use config::{AutomatonConfig, LatticeConfig, PlaybackConfig};
pub use evolve::{evolve, Evolver, Transition};
pub use kernel::{assemble_kernel, build_kernel_volume, depth_pattern};
pub use lattice::init_lattice;
pub use metrics::{MetricsWindow, DEFAULT_WINDOW};
pub use random::{FixedSequence, RandomSource};
pub use store::{MemoryStore, SnapshotStore, StoreError, StoreResult};

pub use gatelattice_core::*;
