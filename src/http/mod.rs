// src/http/mod.rs
//! HTTP surface of the service.

pub mod handlers;
pub mod responses;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
