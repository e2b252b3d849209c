//! Gatelattice Gateway - snapshot persistence service and automaton control over HTTP

pub mod control;
pub mod error;
pub mod player;
pub mod saves;
pub mod server;

pub use error::GatewayError;
pub use player::Player;
pub use server::{router, start_gateway, AppState};
