//! coi-proxy library
//!
//! Wires the isolation worker to a real network layer (reqwest) and an HTTP
//! front door (axum) so an origin that never shipped cross-origin isolation
//! headers can be served through a rewriting proxy.

pub mod config;
pub mod net;
pub mod server;

pub use config::AppConfig;
pub use net::ReqwestFetch;
pub use server::{router, AppState};
