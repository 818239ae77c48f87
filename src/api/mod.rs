//! HTTP API: `POST /api/transcript` and `GET /health`

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{build_router, serve, start_http_server, AppState};
