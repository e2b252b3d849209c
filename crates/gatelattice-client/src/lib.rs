//! Gatelattice Client - snapshot store backed by a remote gateway

pub mod http;

pub use http::HttpStore;
