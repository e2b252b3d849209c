//! Gatelattice Core - Lattice and kernel types, wire protocol, and error handling

pub mod error;
pub mod gate;
pub mod protocol;
pub mod types;

pub use error::{Error, Result};
pub use gate::*;
pub use protocol::*;
pub use types::*;
