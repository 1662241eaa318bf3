//! # modelhub-api
//!
//! HTTP API layer for ModelHub built on Axum.
//!
//! Provides the conversion endpoint, format listing, health check,
//! middleware (CORS, request logging), and the server runner.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
