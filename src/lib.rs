//! Gatelattice - a 3D binary cellular automaton driven by weighted logic-gate kernels

pub mod report;

pub use gatelattice_engine as engine;
