//! Wiregrant HTTP provisioning service
//!
//! Exposes the identity, tunnel, and storage resources over JSON; all
//! pipeline logic lives in `wiregrant-common`.

pub mod config;
pub mod routes;
pub mod server;

pub use config::{AppConfig, StoreBackend};
pub use server::{router, serve, AppState};
